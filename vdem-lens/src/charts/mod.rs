//! Render-ready chart summaries, each in an honest and a distorted variant.
//!
//! A chart is a pure function from derived rows and a config to a
//! serializable summary. The two variants of a chart differ only in their
//! config: the distortion (a truncated or inverted axis, a cherry-picked
//! window, an unweighted mean over the wrong measure) is spelled out in the
//! distorted preset, and the same code computes both.
//!
//! ## Available Charts
//!
//! - **[`PriceOfLiberty`]** (`scatter`): democracy against growth with a pooled trend
//! - **[`IncomeFacets`]** (`facets`): the same scatter split by income group
//! - **[`TurbulenceOfTransition`]** (`dual_axis`): one country's two series on two axes
//! - **[`DiminishingReturns`]** (`binning`): growth averaged per democracy decile
//! - **[`RegimeDistribution`]** (`regime`): growth distribution per regime type
//!
//! ## Example
//!
//! ```rust
//! use vdem_lens::charts::{Chart, DiminishingReturns};
//! use vdem_lens::core::PanelRow;
//! use vdem_lens::derive::{derive_growth, GrowthConfig};
//!
//! let rows: Vec<PanelRow> = (2000..2010)
//!     .map(|year| {
//!         PanelRow::new("Chile", year)
//!             .with_polyarchy(0.8)
//!             .with_gdppc(1000.0 + 50.0 * f64::from(year - 2000))
//!             .with_gdp_growth(4.0)
//!     })
//!     .collect();
//! let derived = derive_growth(&rows, &GrowthConfig::default()).unwrap();
//!
//! let comparison = DiminishingReturns::compare(&derived).unwrap();
//! assert!(comparison.honest.bins[8].value.value().is_some());
//! assert!(comparison.honest.bins[0].value.is_no_data());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzers::TrimmedDomain;
use crate::core::row::DerivedRow;
use crate::error::{LensError, Result};

pub mod binning;
pub mod dual_axis;
pub mod facets;
pub mod regime;
pub mod scatter;

pub use binning::{diminishing_returns, BinSummary, BinningConfig, BinningSummary, DiminishingReturns};
pub use dual_axis::{
    select_entity, turbulence_of_transition, AxisReport, DualAxisConfig, DualAxisSummary,
    SeriesPoint, TurbulenceOfTransition,
};
pub use facets::{income_facets, Facet, FacetConfig, FacetSummary, IncomeFacets};
pub use regime::{regime_distribution, RegimeConfig, RegimeDistribution, RegimeGroup, RegimeSummary};
pub use scatter::{
    price_of_liberty, FeaturedPoint, PriceOfLiberty, ScatterConfig, ScatterPoint, ScatterSummary,
};

/// Which of a chart's two presentations is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartVariant {
    Honest,
    Distorted,
}

impl fmt::Display for ChartVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartVariant::Honest => f.write_str("honest"),
            ChartVariant::Distorted => f.write_str("distorted"),
        }
    }
}

/// A resolved scale domain. `inverted` puts `upper` at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDomain {
    pub lower: f64,
    pub upper: f64,
    pub inverted: bool,
}

impl AxisDomain {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            inverted: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// How much of `natural` this domain shows. Below 1 the axis is
    /// zoomed in and every change looks larger than it is.
    pub fn share_of(&self, natural: &AxisDomain) -> Option<f64> {
        let natural_span = natural.span();
        (natural_span > 0.0).then(|| self.span() / natural_span)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower >= self.upper {
            return Err(LensError::configuration(format!(
                "axis domain must be finite and increasing, got [{}, {}]",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl From<TrimmedDomain> for AxisDomain {
    fn from(domain: TrimmedDomain) -> Self {
        AxisDomain::new(domain.lower, domain.upper)
    }
}

/// How an axis picks its domain from the plotted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AxisPolicy {
    /// A domain chosen up front, whatever the data.
    Fixed { domain: AxisDomain },
    /// Minimum to maximum of the values, widened by `padding`.
    Extent { padding: f64 },
    /// Between two quantiles of the values, widened by `padding`.
    Trimmed {
        lower_p: f64,
        upper_p: f64,
        padding: f64,
    },
    /// From zero to the largest value plus `headroom`, but never below
    /// `min_upper`.
    ZeroBased { min_upper: f64, headroom: f64 },
}

impl AxisPolicy {
    pub fn fixed(lower: f64, upper: f64) -> Self {
        AxisPolicy::Fixed {
            domain: AxisDomain::new(lower, upper),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            AxisPolicy::Fixed { domain } => domain.validate(),
            AxisPolicy::Extent { padding } => validate_padding(*padding),
            AxisPolicy::Trimmed {
                lower_p,
                upper_p,
                padding,
            } => {
                let in_range = |p: f64| (0.0..=1.0).contains(&p);
                if !in_range(*lower_p) || !in_range(*upper_p) || lower_p > upper_p {
                    return Err(LensError::configuration(format!(
                        "trim quantiles must satisfy 0 <= {lower_p} <= {upper_p} <= 1"
                    )));
                }
                validate_padding(*padding)
            }
            AxisPolicy::ZeroBased {
                min_upper,
                headroom,
            } => {
                if !min_upper.is_finite() {
                    return Err(LensError::configuration("axis minimum upper bound must be finite"));
                }
                validate_padding(*headroom)
            }
        }
    }

    /// Resolves the domain for `values`. `None` when the policy depends on
    /// the data and there is none.
    pub fn resolve(&self, values: &[f64]) -> Option<AxisDomain> {
        match self {
            AxisPolicy::Fixed { domain } => Some(*domain),
            AxisPolicy::Extent { padding } => TrimmedDomain::extent(values)
                .map(|domain| AxisDomain::from(domain.padded(*padding))),
            AxisPolicy::Trimmed {
                lower_p,
                upper_p,
                padding,
            } => TrimmedDomain::trimmed(values, *lower_p, *upper_p)
                .map(|domain| AxisDomain::from(domain.padded(*padding))),
            AxisPolicy::ZeroBased {
                min_upper,
                headroom,
            } => {
                let largest = values
                    .iter()
                    .copied()
                    .filter(|v| v.is_finite())
                    .fold(0.0_f64, f64::max);
                Some(AxisDomain::new(0.0, min_upper.max(largest + headroom)))
            }
        }
    }
}

fn validate_padding(padding: f64) -> Result<()> {
    if !padding.is_finite() || padding < 0.0 {
        return Err(LensError::configuration(format!(
            "axis padding must be finite and non-negative, got {padding}"
        )));
    }
    Ok(())
}

/// Configuration shared by every chart.
pub trait ChartConfig: Sized + Clone {
    /// The faithful presentation.
    fn honest() -> Self;

    /// The same data presented with the chart's distortion.
    fn distorted() -> Self;

    fn variant(&self) -> ChartVariant;

    /// Rejects configurations no chart could be drawn from.
    fn validate(&self) -> Result<()>;

    fn preset(variant: ChartVariant) -> Self {
        match variant {
            ChartVariant::Honest => Self::honest(),
            ChartVariant::Distorted => Self::distorted(),
        }
    }
}

/// A chart view over derived rows.
pub trait Chart {
    type Config: ChartConfig;
    type Summary: Serialize;

    /// Stable identifier for the presentation layer.
    const NAME: &'static str;

    fn summarize(rows: &[DerivedRow], config: &Self::Config) -> Result<Self::Summary>;

    /// Both presets over the same rows.
    fn compare(rows: &[DerivedRow]) -> Result<Comparison<Self::Summary>> {
        Ok(Comparison {
            honest: Self::summarize(rows, &Self::Config::honest())?,
            distorted: Self::summarize(rows, &Self::Config::distorted())?,
        })
    }
}

/// The two presentations of one chart, side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison<T> {
    pub honest: T,
    pub distorted: T,
}

/// Counts values that fall outside `domain` and would be drawn off-canvas.
pub(crate) fn count_clipped(values: impl IntoIterator<Item = f64>, domain: Option<&AxisDomain>) -> usize {
    match domain {
        Some(domain) => values.into_iter().filter(|v| !domain.contains(*v)).count(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_policy_pads_quantiles() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let policy = AxisPolicy::Trimmed {
            lower_p: 0.05,
            upper_p: 0.95,
            padding: 1.0,
        };
        let domain = policy.resolve(&values).unwrap();
        assert!((domain.lower - 4.0).abs() < 1e-9);
        assert!((domain.upper - 96.0).abs() < 1e-9);
        assert!(!domain.inverted);
    }

    #[test]
    fn test_extent_and_fixed_policies() {
        let values = [-3.0, 2.0, 12.0];
        assert_eq!(
            AxisPolicy::Extent { padding: 0.0 }.resolve(&values),
            Some(AxisDomain::new(-3.0, 12.0))
        );
        assert_eq!(AxisPolicy::Extent { padding: 0.0 }.resolve(&[]), None);
        assert_eq!(
            AxisPolicy::fixed(0.0, 1.0).resolve(&[]),
            Some(AxisDomain::new(0.0, 1.0))
        );
    }

    #[test]
    fn test_zero_based_policy() {
        let policy = AxisPolicy::ZeroBased {
            min_upper: 8.0,
            headroom: 1.0,
        };
        assert_eq!(policy.resolve(&[2.0, 3.0]), Some(AxisDomain::new(0.0, 8.0)));
        assert_eq!(policy.resolve(&[9.5]), Some(AxisDomain::new(0.0, 10.5)));
        assert_eq!(policy.resolve(&[]), Some(AxisDomain::new(0.0, 8.0)));
    }

    #[test]
    fn test_policy_validation() {
        assert!(AxisPolicy::fixed(1.0, 0.0).validate().is_err());
        assert!(AxisPolicy::Extent { padding: -1.0 }.validate().is_err());
        let bad_trim = AxisPolicy::Trimmed {
            lower_p: 0.9,
            upper_p: 0.1,
            padding: 0.0,
        };
        assert!(bad_trim.validate().is_err());
        assert!(AxisPolicy::fixed(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_share_of_natural_range() {
        let natural = AxisDomain::new(0.0, 1.0);
        let truncated = AxisDomain::new(0.4, 0.65);
        assert!((truncated.share_of(&natural).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(natural.share_of(&AxisDomain::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_policy_serialization() {
        let policy: AxisPolicy =
            serde_json::from_str(r#"{"policy":"zero_based","min_upper":8.0,"headroom":1.0}"#)
                .unwrap();
        assert_eq!(
            policy,
            AxisPolicy::ZeroBased {
                min_upper: 8.0,
                headroom: 1.0
            }
        );
    }

    #[test]
    fn test_count_clipped() {
        let domain = AxisDomain::new(0.0, 10.0);
        assert_eq!(count_clipped([-1.0, 5.0, 11.0], Some(&domain)), 2);
        assert_eq!(count_clipped([-1.0], None), 0);
    }
}
