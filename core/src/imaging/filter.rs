//! Spatial filters: small Gaussian smoothing and area-average resampling.

use crate::imaging::frame::Frame;
use crate::StageResult;

/// Applies a 3x3 Gaussian kernel (1-2-1 separable, normalized by 16) with
/// clamped borders, writing the smoothed pixels into `out`.
pub fn gaussian_blur_3x3(frame: &Frame, out: &mut [u8]) {
    let width = frame.width() as isize;
    let height = frame.height() as isize;
    let src = frame.pixels();
    debug_assert_eq!(out.len(), src.len());

    const KERNEL: [[u16; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

    for y in 0..height {
        for x in 0..width {
            for channel in 0..3usize {
                let mut acc: u32 = 0;
                for (ky, row) in KERNEL.iter().enumerate() {
                    let sy = (y + ky as isize - 1).clamp(0, height - 1);
                    for (kx, &weight) in row.iter().enumerate() {
                        let sx = (x + kx as isize - 1).clamp(0, width - 1);
                        let offset = (sy * width + sx) as usize * 3 + channel;
                        acc += src[offset] as u32 * weight as u32;
                    }
                }
                out[(y * width + x) as usize * 3 + channel] = (acc / 16) as u8;
            }
        }
    }
}

/// Area-average resampling of an interleaved RGB buffer, equivalent to the
/// pixel-area relation used for shrinking without moire artifacts.
pub fn resize_area(frame: &Frame, dst_width: u32, dst_height: u32) -> StageResult<Frame> {
    let src_w = frame.width() as f32;
    let src_h = frame.height() as f32;
    let dst_w = dst_width.max(1);
    let dst_h = dst_height.max(1);
    let scale_x = src_w / dst_w as f32;
    let scale_y = src_h / dst_h as f32;
    let src = frame.pixels();

    let mut data = Vec::with_capacity(dst_w as usize * dst_h as usize * 3);
    for dy in 0..dst_h {
        let y_start = dy as f32 * scale_y;
        let y_end = (y_start + scale_y).min(src_h);
        for dx in 0..dst_w {
            let x_start = dx as f32 * scale_x;
            let x_end = (x_start + scale_x).min(src_w);

            let mut acc = [0f32; 3];
            let mut total_weight = 0f32;
            let mut sy = y_start.floor() as usize;
            while (sy as f32) < y_end {
                let row_weight = (y_end.min(sy as f32 + 1.0) - y_start.max(sy as f32)).max(0.0);
                let mut sx = x_start.floor() as usize;
                while (sx as f32) < x_end {
                    let col_weight =
                        (x_end.min(sx as f32 + 1.0) - x_start.max(sx as f32)).max(0.0);
                    let weight = row_weight * col_weight;
                    let offset = (sy.min(frame.height() as usize - 1)
                        * frame.width() as usize
                        + sx.min(frame.width() as usize - 1))
                        * 3;
                    acc[0] += src[offset] as f32 * weight;
                    acc[1] += src[offset + 1] as f32 * weight;
                    acc[2] += src[offset + 2] as f32 * weight;
                    total_weight += weight;
                    sx += 1;
                }
                sy += 1;
            }

            let norm = total_weight.max(f32::EPSILON);
            for channel in acc {
                data.push((channel / norm).round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    Frame::new(dst_w, dst_h, data)
}

/// Proportional downscale so the longer edge fits `max_edge`. Frames already
/// inside the cap are returned untouched.
pub fn fit_longer_edge(frame: Frame, max_edge: u32) -> StageResult<Frame> {
    let longer = frame.longer_edge();
    if longer <= max_edge {
        return Ok(frame);
    }
    let scale = max_edge as f32 / longer as f32;
    let new_w = ((frame.width() as f32 * scale).round() as u32).max(1);
    let new_h = ((frame.height() as f32 * scale).round() as u32).max(1);
    resize_area(&frame, new_w, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_preserves_constant_regions() {
        let frame = Frame::new(4, 4, vec![100; 4 * 4 * 3]).unwrap();
        let mut out = vec![0u8; 4 * 4 * 3];
        gaussian_blur_3x3(&frame, &mut out);
        assert!(out.iter().all(|&v| (99..=100).contains(&v)));
    }

    #[test]
    fn area_resize_averages_blocks() {
        // 2x2 frame collapsing to a single pixel averages all four values.
        let data = vec![
            0, 0, 0, 100, 100, 100, //
            200, 200, 200, 100, 100, 100,
        ];
        let frame = Frame::new(2, 2, data).unwrap();
        let small = resize_area(&frame, 1, 1).unwrap();
        assert_eq!(small.pixels(), &[100, 100, 100]);
    }

    #[test]
    fn fit_longer_edge_keeps_small_frames() {
        let frame = Frame::new(10, 6, vec![7; 10 * 6 * 3]).unwrap();
        let kept = fit_longer_edge(frame, 1024).unwrap();
        assert_eq!((kept.width(), kept.height()), (10, 6));
    }

    #[test]
    fn fit_longer_edge_scales_proportionally() {
        let frame = Frame::new(2048, 1024, vec![7; 2048 * 1024 * 3]).unwrap();
        let scaled = fit_longer_edge(frame, 1024).unwrap();
        assert_eq!((scaled.width(), scaled.height()), (1024, 512));
        assert_eq!(scaled.longer_edge(), 1024);
    }
}
