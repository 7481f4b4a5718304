//! Descriptive statistics over feature samples.

/// Arithmetic mean, NaN for an empty sample
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0), NaN for an empty sample
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sorted copy of a sample
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile `q` in [0, 1] of an already sorted, non-empty sample.
///
/// Linear interpolation between the two closest order statistics, so
/// `q = 0` is the minimum and `q = 1` the maximum.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&values), 5.0);
        assert_abs_diff_eq!(std_dev(&values), 2.0);
    }

    #[test]
    fn test_empty_stats_are_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_abs_diff_eq!(quantile_sorted(&values, 0.0), 1.0);
        assert_abs_diff_eq!(quantile_sorted(&values, 0.1), 10.9, epsilon = 1e-9);
        assert_abs_diff_eq!(quantile_sorted(&values, 0.5), 50.5, epsilon = 1e-9);
        assert_abs_diff_eq!(quantile_sorted(&values, 1.0), 100.0);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_abs_diff_eq!(quantile_sorted(&[3.5], 0.7), 3.5);
    }
}
