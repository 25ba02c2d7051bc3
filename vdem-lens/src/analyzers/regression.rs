//! Ordinary least squares trend lines.
//!
//! The fit is computed from running sums, so a state can be filled in one
//! pass and states from different groups merged before fitting:
//!
//! ```text
//! slope     = (n*Sxy - Sx*Sy) / (n*Sxx - Sx^2)
//! intercept = (Sy - slope*Sx) / n
//! r^2       = (n*Sxy - Sx*Sy)^2 / ((n*Sxx - Sx^2) * (n*Syy - Sy^2))
//! ```

use serde::{Deserialize, Serialize};

use super::traits::AnalyzerState;

/// Running sums for a simple linear regression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionState {
    pub n: u64,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xy: f64,
    pub sum_xx: f64,
    pub sum_yy: f64,
}

impl RegressionState {
    /// Adds a point. Pairs with a non-finite coordinate are skipped.
    pub fn push(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.n += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_xy += x * y;
        self.sum_xx += x * x;
        self.sum_yy += y * y;
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut state = Self::default();
        for (x, y) in points {
            state.push(x, y);
        }
        state
    }

    /// Fits the line through the accumulated points.
    ///
    /// Never fails. With no points the line is flat at zero; with one point,
    /// or when every x is the same, the line is flat at the mean of y and the
    /// fit is marked insufficient.
    pub fn fit(&self) -> RegressionFit {
        if self.n == 0 {
            return RegressionFit {
                slope: 0.0,
                intercept: 0.0,
                r_squared: None,
                n: 0,
                insufficient: true,
            };
        }

        let n = self.n as f64;
        let mean_y = self.sum_y / n;
        let x_spread = n * self.sum_xx - self.sum_x * self.sum_x;
        let y_spread = n * self.sum_yy - self.sum_y * self.sum_y;
        let covariance = n * self.sum_xy - self.sum_x * self.sum_y;

        if self.n < 2 || is_negligible(x_spread, n * self.sum_xx) {
            return RegressionFit {
                slope: 0.0,
                intercept: mean_y,
                r_squared: None,
                n: self.n,
                insufficient: true,
            };
        }

        let slope = covariance / x_spread;
        let intercept = (self.sum_y - slope * self.sum_x) / n;
        let r_squared = if is_negligible(y_spread, n * self.sum_yy) {
            None
        } else {
            Some(((covariance * covariance) / (x_spread * y_spread)).clamp(0.0, 1.0))
        };

        RegressionFit {
            slope,
            intercept,
            r_squared,
            n: self.n,
            insufficient: false,
        }
    }
}

impl AnalyzerState for RegressionState {
    fn combine(self, other: &Self) -> Self {
        Self {
            n: self.n + other.n,
            sum_x: self.sum_x + other.sum_x,
            sum_y: self.sum_y + other.sum_y,
            sum_xy: self.sum_xy + other.sum_xy,
            sum_xx: self.sum_xx + other.sum_xx,
            sum_yy: self.sum_yy + other.sum_yy,
        }
    }

    fn is_empty(&self) -> bool {
        self.n == 0
    }
}

// Cancellation in `n*Sxx - Sx^2` leaves rounding noise instead of an exact
// zero for constant inputs.
fn is_negligible(spread: f64, scale: f64) -> bool {
    spread <= 1e-12 * scale.abs().max(f64::MIN_POSITIVE)
}

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; `None` when either variable is constant.
    pub r_squared: Option<f64>,
    pub n: u64,
    /// Set when fewer than two distinct x values were available.
    pub insufficient: bool,
}

impl RegressionFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// End points of the fitted line over `[x0, x1]`, for drawing.
    pub fn line(&self, x0: f64, x1: f64) -> [(f64, f64); 2] {
        [(x0, self.predict(x0)), (x1, self.predict(x1))]
    }
}

/// Fits a line through complete `(x, y)` pairs.
///
/// # Examples
///
/// ```rust
/// use vdem_lens::analyzers::fit_line;
///
/// let fit = fit_line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]);
/// assert!((fit.slope - 2.0).abs() < 1e-12);
/// assert!((fit.intercept - 1.0).abs() < 1e-12);
/// ```
pub fn fit_line(points: &[(f64, f64)]) -> RegressionFit {
    RegressionState::from_points(points.iter().copied()).fit()
}
