//! Five-number box summaries.

use serde::{Deserialize, Serialize};

use super::quantile::{quantile_sorted, sorted_finite};

/// Box-and-whisker summary of a sample.
///
/// Whiskers follow Tukey: the lower whisker is the smallest observation at
/// or above `q1 - 1.5 * IQR` and the upper whisker the largest at or below
/// `q3 + 1.5 * IQR`. Observations beyond the whiskers are listed as outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarizes the finite values of `sample`. `None` when there are none.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vdem_lens::analyzers::BoxSummary;
    ///
    /// let summary = BoxSummary::from_sample(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    /// assert_eq!(summary.median, 3.0);
    /// assert_eq!(summary.upper_whisker, 4.0);
    /// assert_eq!(summary.outliers, vec![100.0]);
    /// ```
    pub fn from_sample(sample: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(sample);
        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;

        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        // q1 and q3 lie inside the fences, so both searches find a value
        let lower_whisker = sorted.iter().copied().find(|&v| v >= low_fence)?;
        let upper_whisker = sorted.iter().rev().copied().find(|&v| v <= high_fence)?;
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < lower_whisker || v > upper_whisker)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            count: sorted.len(),
            outliers,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_summary_quartiles() {
        let sample: Vec<f64> = (1..=9).map(f64::from).collect();
        let summary = BoxSummary::from_sample(&sample).unwrap();
        assert_eq!(summary.q1, 3.0);
        assert_eq!(summary.median, 5.0);
        assert_eq!(summary.q3, 7.0);
        assert_eq!(summary.iqr(), 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 9.0);
        assert!(summary.outliers.is_empty());
        assert_eq!(summary.count, 9);
    }

    #[test]
    fn test_box_summary_outliers_on_both_sides() {
        let sample = [-50.0, 1.0, 2.0, 3.0, 4.0, 5.0, 60.0];
        let summary = BoxSummary::from_sample(&sample).unwrap();
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.upper_whisker, 5.0);
        assert_eq!(summary.outliers, vec![-50.0, 60.0]);
        assert_eq!(summary.min, -50.0);
        assert_eq!(summary.max, 60.0);
    }

    #[test]
    fn test_box_summary_degenerate_samples() {
        assert_eq!(BoxSummary::from_sample(&[]), None);
        assert_eq!(BoxSummary::from_sample(&[f64::NAN]), None);

        let single = BoxSummary::from_sample(&[2.0]).unwrap();
        assert_eq!(single.q1, 2.0);
        assert_eq!(single.upper_whisker, 2.0);
        assert_eq!(single.count, 1);
    }
}
