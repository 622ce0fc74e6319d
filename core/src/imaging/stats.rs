pub struct PlaneStats;

impl PlaneStats {
    pub fn mean(plane: &[u8]) -> f32 {
        if plane.is_empty() {
            return 0.0;
        }
        let sum: u64 = plane.iter().map(|&v| v as u64).sum();
        sum as f32 / plane.len() as f32
    }

    pub fn range(plane: &[u8]) -> (u8, u8) {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for &value in plane {
            min = min.min(value);
            max = max.max(value);
        }
        if plane.is_empty() {
            (0, 0)
        } else {
            (min, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_empty_plane_yields_zero() {
        assert_eq!(PlaneStats::mean(&[]), 0.0);
    }

    #[test]
    fn mean_handles_single_value() {
        assert_eq!(PlaneStats::mean(&[40]), 40.0);
    }

    #[test]
    fn range_spans_min_and_max() {
        assert_eq!(PlaneStats::range(&[3, 250, 17]), (3, 250));
    }
}
