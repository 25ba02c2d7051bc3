//! Growth distribution per regime type, as box summaries.
//!
//! Showing the whole distribution makes plain how much growth varies within
//! every regime type. The distorted preset sizes the axis to the most extreme
//! years, which squashes every box into a thin line.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{count_clipped, AxisDomain, AxisPolicy, Chart, ChartConfig, ChartVariant};
use crate::analyzers::{mean, BoxSummary, Estimate};
use crate::core::filter::RowFilter;
use crate::core::row::{DerivedRow, Field, Regime};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub variant: ChartVariant,
    pub filter: RowFilter,
    pub value_field: Field,
    pub y_axis: AxisPolicy,
}

impl ChartConfig for RegimeConfig {
    fn honest() -> Self {
        Self {
            variant: ChartVariant::Honest,
            filter: RowFilter::new().years(1990, 2019),
            value_field: Field::GdppcGrowth,
            y_axis: AxisPolicy::Trimmed {
                lower_p: 0.002,
                upper_p: 0.998,
                padding: 0.0,
            },
        }
    }

    fn distorted() -> Self {
        Self {
            variant: ChartVariant::Distorted,
            y_axis: AxisPolicy::Extent { padding: 0.0 },
            ..Self::honest()
        }
    }

    fn variant(&self) -> ChartVariant {
        self.variant
    }

    fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.y_axis.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeGroup {
    pub regime: Regime,
    pub label: String,
    /// `None` for a regime with no observations.
    pub summary: Option<BoxSummary>,
    pub mean: Estimate,
    /// Raw values in ascending order, for a jittered dot overlay.
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeSummary {
    pub variant: ChartVariant,
    /// One group per regime in code order, empty ones included.
    pub groups: Vec<RegimeGroup>,
    pub y_domain: Option<AxisDomain>,
    pub clipped: usize,
}

/// Builds the per-regime box plot.
#[instrument(skip(rows, config), fields(rows = rows.len(), variant = %config.variant))]
pub fn regime_distribution(rows: &[DerivedRow], config: &RegimeConfig) -> Result<RegimeSummary> {
    config.validate()?;

    let mut buckets: [Vec<f64>; 4] = Default::default();
    for row in config.filter.apply(rows) {
        let (Some(regime), Some(value)) = (row.row.regime, row.value(config.value_field)) else {
            continue;
        };
        if value.is_finite() {
            buckets[usize::from(regime.code())].push(value);
        }
    }

    let groups: Vec<RegimeGroup> = Regime::ALL
        .iter()
        .zip(buckets)
        .map(|(&regime, mut values)| {
            values.sort_by(f64::total_cmp);
            RegimeGroup {
                regime,
                label: regime.label().to_string(),
                summary: BoxSummary::from_sample(&values),
                mean: mean(&values).into(),
                values,
            }
        })
        .collect();

    let all: Vec<f64> = groups.iter().flat_map(|g| g.values.iter().copied()).collect();
    let y_domain = config.y_axis.resolve(&all);
    let clipped = count_clipped(all.iter().copied(), y_domain.as_ref());
    debug!(values = all.len(), clipped, "Computed regime distribution");

    Ok(RegimeSummary {
        variant: config.variant,
        groups,
        y_domain,
        clipped,
    })
}

/// Marker type for the per-regime box plot.
pub struct RegimeDistribution;

impl Chart for RegimeDistribution {
    type Config = RegimeConfig;
    type Summary = RegimeSummary;

    const NAME: &'static str = "regime_distribution";

    fn summarize(rows: &[DerivedRow], config: &RegimeConfig) -> Result<RegimeSummary> {
        regime_distribution(rows, config)
    }
}
