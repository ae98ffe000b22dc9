//! Proportional column widths.
//!
//! Tables declare columns as relative weights. They are scaled to the
//! available width in whole points so that cell boundaries, separators and
//! right-aligned text all land on the same integer grid.

/// Scale `weights` to integer widths that sum exactly to `target`.
///
/// Each weight is scaled by `target / sum` and floored; whatever the flooring
/// lost is added to the last column. A non-positive sum splits the target
/// evenly.
pub fn scale_columns(weights: &[f64], target: u32) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }

    let sum: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    let mut widths: Vec<u32> = if sum > 0.0 {
        let scale = target as f64 / sum;
        weights
            .iter()
            .map(|w| {
                if w.is_finite() && *w > 0.0 {
                    (w * scale).floor() as u32
                } else {
                    0
                }
            })
            .collect()
    } else {
        vec![target / weights.len() as u32; weights.len()]
    };

    let used: u32 = widths.iter().sum();
    if let Some(last) = widths.last_mut() {
        // Flooring only ever loses width, so `used <= target`.
        *last += target.saturating_sub(used);
    }
    widths
}

/// Left edges of each column given its widths, starting at `origin`.
pub fn column_offsets(widths: &[u32], origin: f64) -> Vec<f64> {
    let mut x = origin;
    widths
        .iter()
        .map(|w| {
            let left = x;
            x += *w as f64;
            left
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_exactly_to_target() {
        let widths = scale_columns(&[28.0, 12.0, 12.0, 12.0, 10.0, 12.0], 495);
        assert_eq!(widths.iter().sum::<u32>(), 495);
    }

    #[test]
    fn residual_goes_to_last_column() {
        // 100 / 3 = 33.33.. floors to 33 each; the lost 1 lands on the last.
        assert_eq!(scale_columns(&[1.0, 1.0, 1.0], 100), vec![33, 33, 34]);
    }

    #[test]
    fn proportional_when_divisible() {
        assert_eq!(scale_columns(&[2.0, 1.0, 1.0], 400), vec![200, 100, 100]);
    }

    #[test]
    fn many_columns_small_target() {
        let widths = scale_columns(&[1.0; 12], 7);
        assert_eq!(widths.iter().sum::<u32>(), 7);
        assert_eq!(widths[11], 7);
    }

    #[test]
    fn empty_and_degenerate_inputs() {
        assert!(scale_columns(&[], 100).is_empty());
        assert_eq!(scale_columns(&[0.0, 0.0], 9), vec![4, 5]);
        assert_eq!(scale_columns(&[5.0], 0), vec![0]);
    }

    #[test]
    fn sum_holds_across_targets() {
        let weights = [26.0, 14.0, 13.0, 13.0, 14.0, 10.0, 12.0];
        for target in [0, 1, 50, 333, 495, 515, 1000] {
            let widths = scale_columns(&weights, target);
            assert_eq!(widths.len(), weights.len());
            assert_eq!(widths.iter().sum::<u32>(), target, "target {}", target);
        }
    }

    #[test]
    fn offsets_accumulate() {
        assert_eq!(column_offsets(&[10, 20, 5], 40.0), vec![40.0, 50.0, 70.0]);
    }
}
