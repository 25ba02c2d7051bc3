//! Arithmetic, population-weighted and geometric means.
//!
//! Growth rates compound. Averaging percentages arithmetically overstates
//! the rate that, applied every period, reproduces the cumulative change;
//! the gap widens with volatility. [`GeometricMeanState`] averages growth
//! factors in log space instead, and the distorted chart variants use the
//! arithmetic mean on purpose.

use serde::{Deserialize, Serialize};

use super::traits::AnalyzerState;
use crate::error::{LensError, Result};

/// State for the arithmetic mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanState {
    /// Sum of all values.
    pub sum: f64,
    /// Count of finite values.
    pub count: u64,
}

impl MeanState {
    /// Adds a value. Non-finite values are ignored.
    pub fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

impl AnalyzerState for MeanState {
    fn combine(self, other: &Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// State for a weighted mean.
///
/// An absent weight counts as 1. Negative or non-finite weights are
/// rejected rather than silently clamped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedMeanState {
    pub weighted_sum: f64,
    pub total_weight: f64,
    pub count: u64,
}

impl WeightedMeanState {
    /// Adds a value with its weight. Non-finite values are ignored.
    pub fn push(&mut self, value: f64, weight: Option<f64>) -> Result<()> {
        let weight = weight.unwrap_or(1.0);
        if !weight.is_finite() || weight < 0.0 {
            return Err(LensError::InvalidWeight { weight });
        }
        if value.is_finite() {
            self.weighted_sum += value * weight;
            self.total_weight += weight;
            self.count += 1;
        }
        Ok(())
    }

    /// `None` when the total weight is zero.
    pub fn mean(&self) -> Option<f64> {
        if self.total_weight > 0.0 {
            Some(self.weighted_sum / self.total_weight)
        } else {
            None
        }
    }
}

impl AnalyzerState for WeightedMeanState {
    fn combine(self, other: &Self) -> Self {
        Self {
            weighted_sum: self.weighted_sum + other.weighted_sum,
            total_weight: self.total_weight + other.total_weight,
            count: self.count + other.count,
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// State for the geometric mean of percent growth rates.
///
/// Each rate `g` becomes the factor `1 + g / 100`. Only strictly positive
/// factors compound, so a growth of -100% or worse is counted in `rejected`.
/// Once any rate is rejected the compound average is undefined for the
/// whole sample and [`mean_growth`](Self::mean_growth) reports `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometricMeanState {
    /// Sum of ln(factor).
    pub log_sum: f64,
    pub count: u64,
    pub rejected: u64,
}

impl GeometricMeanState {
    pub fn push_growth(&mut self, growth_percent: f64) {
        let factor = 1.0 + growth_percent / 100.0;
        if factor.is_finite() && factor > 0.0 {
            self.log_sum += factor.ln();
            self.count += 1;
        } else {
            self.rejected += 1;
        }
    }

    /// Compound average growth in percent.
    pub fn mean_growth(&self) -> Option<f64> {
        if self.count == 0 || self.rejected > 0 {
            return None;
        }
        let factor = (self.log_sum / self.count as f64).exp();
        Some((factor - 1.0) * 100.0)
    }
}

impl AnalyzerState for GeometricMeanState {
    fn combine(self, other: &Self) -> Self {
        Self {
            log_sum: self.log_sum + other.log_sum,
            count: self.count + other.count,
            rejected: self.rejected + other.rejected,
        }
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Arithmetic mean of the finite values in `values`.
pub fn mean(values: &[f64]) -> Option<f64> {
    let mut state = MeanState::default();
    values.iter().for_each(|&v| state.push(v));
    state.mean()
}

/// Weighted mean of `(value, weight)` pairs.
pub fn weighted_mean(values: &[(f64, Option<f64>)]) -> Result<Option<f64>> {
    let mut state = WeightedMeanState::default();
    for &(value, weight) in values {
        state.push(value, weight)?;
    }
    Ok(state.mean())
}

/// Compound average of percent growth rates.
///
/// # Examples
///
/// ```rust
/// use vdem_lens::analyzers::{arithmetic_mean_growth, geometric_mean_growth};
///
/// // +10% then -10% leaves you 1% poorer, not flat
/// let growth = [10.0, -10.0];
/// assert_eq!(arithmetic_mean_growth(&growth), Some(0.0));
/// assert!(geometric_mean_growth(&growth).unwrap() < -0.5);
/// ```
pub fn geometric_mean_growth(growth_percent: &[f64]) -> Option<f64> {
    let mut state = GeometricMeanState::default();
    growth_percent.iter().for_each(|&g| state.push_growth(g));
    state.mean_growth()
}

/// Arithmetic average of percent growth rates, the naive counterpart of
/// [`geometric_mean_growth`].
pub fn arithmetic_mean_growth(growth_percent: &[f64]) -> Option<f64> {
    mean(growth_percent)
}
