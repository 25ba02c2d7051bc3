//! "Diminishing Returns Cliff": growth averaged per democracy decile.
//!
//! The honest preset averages per-capita growth weighted by population and
//! leaves empty deciles as gaps. The distorted preset averages total GDP
//! growth over every year with each country-year counting once, so small
//! fast-growing autocracies dominate the low deciles.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{AxisDomain, AxisPolicy, Chart, ChartConfig, ChartVariant};
use crate::analyzers::{accumulate, Averaging, BinStrategy, Estimate, GroupAccumulator};
use crate::core::filter::RowFilter;
use crate::core::row::{DerivedRow, Field};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    pub variant: ChartVariant,
    pub filter: RowFilter,
    /// Field the bins partition.
    pub index_field: Field,
    /// Field averaged within each bin.
    pub value_field: Field,
    pub weight_field: Option<Field>,
    pub bins: BinStrategy,
    pub averaging: Averaging,
    pub y_axis: AxisPolicy,
}

impl ChartConfig for BinningConfig {
    fn honest() -> Self {
        Self {
            variant: ChartVariant::Honest,
            filter: RowFilter::new().years(2000, 2019).require(Field::Polyarchy),
            index_field: Field::Polyarchy,
            value_field: Field::GdppcGrowth,
            weight_field: Some(Field::Population),
            bins: BinStrategy::deciles(),
            averaging: Averaging::PopulationWeighted,
            y_axis: AxisPolicy::ZeroBased {
                min_upper: 8.0,
                headroom: 1.0,
            },
        }
    }

    fn distorted() -> Self {
        Self {
            variant: ChartVariant::Distorted,
            filter: RowFilter::new().require(Field::Polyarchy),
            value_field: Field::GdpGrowth,
            averaging: Averaging::Arithmetic,
            y_axis: AxisPolicy::ZeroBased {
                min_upper: 0.0,
                headroom: 0.0,
            },
            ..Self::honest()
        }
    }

    fn variant(&self) -> ChartVariant {
        self.variant
    }

    fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.bins.validate()?;
        self.y_axis.validate()
    }
}

impl BinningConfig {
    pub fn with_averaging(mut self, averaging: Averaging) -> Self {
        self.averaging = averaging;
        self
    }

    pub fn with_bins(mut self, bins: BinStrategy) -> Self {
        self.bins = bins;
        self
    }
}

/// One bar of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinSummary {
    pub index: usize,
    pub label: String,
    pub count: u64,
    /// The bar height under the configured averaging.
    pub value: Estimate,
    pub arithmetic: Estimate,
    pub weighted: Estimate,
    /// Compound growth, for contrast with the arithmetic column.
    pub geometric: Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinningSummary {
    pub variant: ChartVariant,
    pub averaging: Averaging,
    /// Every bin in order, empty ones included.
    pub bins: Vec<BinSummary>,
    pub y_domain: Option<AxisDomain>,
    /// Rows with a value whose index fell outside every bin.
    pub unassigned: usize,
    /// Rows left out of every column because their weight was negative or
    /// non-finite.
    pub skipped_weights: u64,
}

/// Builds the binned bar chart.
#[instrument(skip(rows, config), fields(rows = rows.len(), variant = %config.variant))]
pub fn diminishing_returns(rows: &[DerivedRow], config: &BinningConfig) -> Result<BinningSummary> {
    config.validate()?;

    let selected = config.filter.apply(rows);
    let index_sample: Vec<f64> = selected
        .iter()
        .filter_map(|row| row.value(config.index_field))
        .collect();
    let bucketer = config.bins.fit(&index_sample)?;

    let mut unassigned = 0;
    let mut observations = Vec::with_capacity(selected.len());
    for row in &selected {
        let (Some(index), Some(value)) = (row.value(config.index_field), row.value(config.value_field))
        else {
            continue;
        };
        match bucketer.assign(index) {
            Some(bin) => {
                let weight = config.weight_field.and_then(|field| row.value(field));
                observations.push((bin, value, weight));
            }
            None => unassigned += 1,
        }
    }
    let groups = accumulate(observations);
    let skipped_weights: u64 = groups.values().map(|group| group.skipped).sum();
    if skipped_weights > 0 {
        warn!(skipped_weights, "Skipped rows with unusable weights");
    }

    let empty = GroupAccumulator::default();
    let bins: Vec<BinSummary> = (0..bucketer.bucket_count())
        .map(|index| {
            let summary = groups.get(&index).unwrap_or(&empty).summary();
            BinSummary {
                index,
                label: bucketer.label(index),
                count: summary.count,
                value: summary.get(config.averaging),
                arithmetic: summary.arithmetic,
                weighted: summary.weighted,
                geometric: summary.geometric,
            }
        })
        .collect();

    let heights: Vec<f64> = bins.iter().filter_map(|bin| bin.value.value()).collect();
    let y_domain = config.y_axis.resolve(&heights);
    debug!(
        bins = bins.len(),
        filled = heights.len(),
        unassigned,
        "Computed binned averages"
    );

    Ok(BinningSummary {
        variant: config.variant,
        averaging: config.averaging,
        bins,
        y_domain,
        unassigned,
        skipped_weights,
    })
}

/// Marker type for the binned bar chart.
pub struct DiminishingReturns;

impl Chart for DiminishingReturns {
    type Config = BinningConfig;
    type Summary = BinningSummary;

    const NAME: &'static str = "diminishing_returns";

    fn summarize(rows: &[DerivedRow], config: &BinningConfig) -> Result<BinningSummary> {
        diminishing_returns(rows, config)
    }
}
