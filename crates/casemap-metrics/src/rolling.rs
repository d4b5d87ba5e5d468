use crate::window::WINDOW_DAYS;

/// Trailing 7-day mean at every index.
///
/// The first six entries have no full look-back and carry the raw value
/// through unchanged instead of a partial mean.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rolling_average(values: &[i64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i + 1 < WINDOW_DAYS {
                v as f64
            } else {
                let sum: i64 = values[i + 1 - WINDOW_DAYS..=i].iter().sum();
                sum as f64 / WINDOW_DAYS as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_six_are_raw_values() {
        let values = [5, 40, 3, 100, 0, 7, 1, 2, 3, 4];
        let avg = rolling_average(&values);
        for i in 0..6 {
            assert!((avg[i] - values[i] as f64).abs() < f64::EPSILON, "index {i}");
        }
    }

    #[test]
    fn from_index_six_is_trailing_mean() {
        let values: Vec<i64> = (1..=10).collect();
        let avg = rolling_average(&values);
        assert!((avg[6] - 4.0).abs() < 1e-9);
        assert!((avg[7] - 5.0).abs() < 1e-9);
        assert!((avg[9] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn output_matches_input_length() {
        assert!(rolling_average(&[]).is_empty());
        assert_eq!(rolling_average(&[1, 2, 3]).len(), 3);
    }
}
