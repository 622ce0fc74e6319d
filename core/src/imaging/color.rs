//! sRGB <-> CIE Lab conversion on 8-bit planes.
//!
//! Follows the common 8-bit quantization (L scaled to 0..=255, a/b offset
//! by 128) so the luminance plane can feed histogram equalization directly.

/// Lab planes split out of an RGB frame. `l` carries luminance, `a`/`b`
/// the chrominance components.
#[derive(Debug, Clone)]
pub struct LabPlanes {
    pub l: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> u8 {
    let v = value.clamp(0.0, 1.0);
    let s = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round().clamp(0.0, 255.0) as u8
}

// D65 reference white.
const XN: f32 = 0.950_47;
const YN: f32 = 1.0;
const ZN: f32 = 1.088_83;

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn pixel_to_lab(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rl, gl, bl) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));

    let x = 0.412_456_4 * rl + 0.357_576_1 * gl + 0.180_437_5 * bl;
    let y = 0.212_672_9 * rl + 0.715_152_2 * gl + 0.072_175_0 * bl;
    let z = 0.019_333_9 * rl + 0.119_192_0 * gl + 0.950_304_1 * bl;

    let (fx, fy, fz) = (lab_f(x / XN), lab_f(y / YN), lab_f(z / ZN));
    let l_star = 116.0 * fy - 16.0;
    let a_star = 500.0 * (fx - fy);
    let b_star = 200.0 * (fy - fz);

    let l_u8 = (l_star * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8;
    let a_u8 = (a_star + 128.0).round().clamp(0.0, 255.0) as u8;
    let b_u8 = (b_star + 128.0).round().clamp(0.0, 255.0) as u8;
    (l_u8, a_u8, b_u8)
}

fn lab_to_pixel(l: u8, a: u8, b: u8) -> (u8, u8, u8) {
    let l_star = l as f32 * 100.0 / 255.0;
    let a_star = a as f32 - 128.0;
    let b_star = b as f32 - 128.0;

    let fy = (l_star + 16.0) / 116.0;
    let fx = fy + a_star / 500.0;
    let fz = fy - b_star / 200.0;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    let rl = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
    let gl = -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z;
    let bl = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;

    (linear_to_srgb(rl), linear_to_srgb(gl), linear_to_srgb(bl))
}

/// Splits an interleaved RGB buffer into quantized Lab planes.
pub fn split_lab(rgb: &[u8]) -> LabPlanes {
    let pixel_count = rgb.len() / 3;
    let mut planes = LabPlanes {
        l: Vec::with_capacity(pixel_count),
        a: Vec::with_capacity(pixel_count),
        b: Vec::with_capacity(pixel_count),
    };
    for chunk in rgb.chunks_exact(3) {
        let (l, a, b) = pixel_to_lab(chunk[0], chunk[1], chunk[2]);
        planes.l.push(l);
        planes.a.push(a);
        planes.b.push(b);
    }
    planes
}

/// Recombines Lab planes into an interleaved RGB buffer.
pub fn merge_lab(planes: &LabPlanes, out: &mut [u8]) {
    for (index, target) in out.chunks_exact_mut(3).enumerate() {
        let (r, g, b) = lab_to_pixel(planes.l[index], planes.a[index], planes.b[index]);
        target[0] = r;
        target[1] = g;
        target[2] = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_pixel_round_trips_within_tolerance() {
        for &value in &[0u8, 64, 128, 200, 255] {
            let (l, a, b) = pixel_to_lab(value, value, value);
            // Neutral gray keeps chrominance at the midpoint.
            assert!((a as i16 - 128).abs() <= 1, "a plane drifted for {value}");
            assert!((b as i16 - 128).abs() <= 1, "b plane drifted for {value}");
            let (r2, g2, b2) = lab_to_pixel(l, a, b);
            assert!((r2 as i16 - value as i16).abs() <= 2);
            assert!((g2 as i16 - value as i16).abs() <= 2);
            assert!((b2 as i16 - value as i16).abs() <= 2);
        }
    }

    #[test]
    fn split_and_merge_preserve_length() {
        let rgb = vec![10u8, 200, 30, 250, 5, 90];
        let planes = split_lab(&rgb);
        assert_eq!(planes.l.len(), 2);
        let mut out = vec![0u8; 6];
        merge_lab(&planes, &mut out);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn luminance_orders_dark_and_bright() {
        let dark = split_lab(&[20, 20, 20]);
        let bright = split_lab(&[240, 240, 240]);
        assert!(bright.l[0] > dark.l[0]);
    }
}
