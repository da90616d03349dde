//! Descriptive statistics over `f64` columns
//!
//! Missing values are represented as `NaN`; every helper here ignores
//! non-finite inputs unless stated otherwise.

/// Collect the finite values of a column, sorted ascending
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile with linear interpolation between order statistics.
///
/// `sorted` must already be sorted ascending and contain only finite values.
/// Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Quantile of the finite values in `values`
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(values), q)
}

/// Median of the finite values in `values`
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Arithmetic mean of the finite values
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Sample standard deviation (`ddof = 1`).
///
/// A single observation has no defined sample deviation and yields `NaN`.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Population standard deviation (`ddof = 0`) around a known mean
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
    }

    #[test]
    fn test_median_ignores_missing() {
        let values = vec![f64::NAN, 5.0, 1.0, f64::INFINITY, 3.0];
        assert_eq!(median(&values), Some(3.0));
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0, f64::NAN]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sample_std() {
        assert!(sample_std(&[7.0]).is_nan());
        let s = sample_std(&[2.0, 4.0]);
        assert!((s - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_population_std() {
        let values = [1.0, 3.0];
        assert_eq!(population_std(&values, 2.0), 1.0);
        assert_eq!(population_std(&[], 0.0), 0.0);
    }
}
