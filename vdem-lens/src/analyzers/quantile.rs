//! Exact sample quantiles and quantile-trimmed axis domains.
//!
//! Quantiles use linear interpolation between order statistics (R-7, the
//! definition used by R, NumPy and d3): for a sorted sample `x` of length
//! `n`, `h = (n - 1) * p` and the result is
//! `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sorts finite values ascending, dropping NaN and infinities.
pub fn sorted_finite(sample: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Returns the `p`-quantile of `sample`.
///
/// Non-finite values are ignored. Returns `None` for an empty sample or a `p`
/// outside `[0, 1]`.
///
/// # Examples
///
/// ```rust
/// use vdem_lens::analyzers::quantile;
///
/// let sample = [3.0, 1.0, 2.0, 4.0];
/// assert_eq!(quantile(&sample, 0.0), Some(1.0));
/// assert_eq!(quantile(&sample, 0.5), Some(2.5));
/// assert_eq!(quantile(&sample, 1.0), Some(4.0));
/// ```
pub fn quantile(sample: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(sample), p)
}

/// Returns the `p`-quantile of an already sorted, finite sample.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = (n - 1) as f64 * p;
    let lower = h.floor() as usize;
    let fraction = h - h.floor();

    if lower + 1 >= n {
        Some(sorted[n - 1])
    } else {
        Some(sorted[lower] + fraction * (sorted[lower + 1] - sorted[lower]))
    }
}

/// Computes several quantiles with a single sort.
pub fn quantiles(sample: &[f64], probabilities: &[f64]) -> Vec<Option<f64>> {
    let sorted = sorted_finite(sample);
    probabilities
        .iter()
        .map(|&p| quantile_sorted(&sorted, p))
        .collect()
}

/// A closed numeric interval used as a scale domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimmedDomain {
    pub lower: f64,
    pub upper: f64,
}

impl TrimmedDomain {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// The domain between the `lower_p` and `upper_p` quantiles of `sample`.
    ///
    /// Values beyond the cut-offs fall outside the domain.
    pub fn trimmed(sample: &[f64], lower_p: f64, upper_p: f64) -> Option<Self> {
        if lower_p > upper_p {
            return None;
        }
        let sorted = sorted_finite(sample);
        Some(Self {
            lower: quantile_sorted(&sorted, lower_p)?,
            upper: quantile_sorted(&sorted, upper_p)?,
        })
    }

    /// The full min/max extent of `sample`.
    pub fn extent(sample: &[f64]) -> Option<Self> {
        Self::trimmed(sample, 0.0, 1.0)
    }

    /// Widens both ends by `padding`.
    pub fn padded(self, padding: f64) -> Self {
        Self {
            lower: self.lower - padding,
            upper: self.upper + padding,
        }
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let sample = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(quantile(&sample, 0.25), Some(20.0));
        assert!((quantile(&sample, 0.1).unwrap() - 14.0).abs() < 1e-9);
        assert!((quantile(&sample, 0.95).unwrap() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_edge_cases() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.3), Some(7.0));
        assert_eq!(quantile(&[1.0, 2.0], -0.1), None);
        assert_eq!(quantile(&[1.0, 2.0], 1.1), None);
        assert_eq!(quantile(&[1.0, 2.0], f64::NAN), None);
    }

    #[test]
    fn test_quantile_ignores_non_finite_values() {
        let sample = [f64::NAN, 1.0, f64::INFINITY, 3.0];
        assert_eq!(quantile(&sample, 0.5), Some(2.0));
    }

    #[test]
    fn test_quantiles_share_one_sort() {
        let sample = [5.0, 1.0, 3.0];
        assert_eq!(
            quantiles(&sample, &[0.0, 0.5, 1.0, 2.0]),
            vec![Some(1.0), Some(3.0), Some(5.0), None]
        );
    }

    #[test]
    fn test_trimmed_domain_excludes_tails() {
        let mut sample: Vec<f64> = (0..=100).map(f64::from).collect();
        sample.push(10_000.0);
        let domain = TrimmedDomain::trimmed(&sample, 0.05, 0.95).unwrap();
        assert!(domain.upper < 100.0);
        assert!(!domain.contains(10_000.0));

        let extent = TrimmedDomain::extent(&sample).unwrap();
        assert_eq!(extent, TrimmedDomain::new(0.0, 10_000.0));
    }

    #[test]
    fn test_padded_domain() {
        let domain = TrimmedDomain::new(-2.0, 8.0).padded(1.0);
        assert_eq!(domain, TrimmedDomain::new(-3.0, 9.0));
        assert_eq!(domain.span(), 12.0);
    }

    #[test]
    fn test_trimmed_domain_requires_ordered_probabilities() {
        assert_eq!(TrimmedDomain::trimmed(&[1.0, 2.0], 0.9, 0.1), None);
        assert_eq!(TrimmedDomain::trimmed(&[], 0.1, 0.9), None);
    }
}
