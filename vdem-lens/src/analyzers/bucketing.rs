//! Partitioning values into ordered buckets.
//!
//! Two strategies are supported. Fixed-width bins split a bounded range into
//! equal intervals, each left-inclusive, with the last bin also closed on the
//! right. Quantile cuts take their cut points from the sample being
//! partitioned; a value lands in the first bucket whose upper cut it does not
//! exceed, and the last bucket takes everything above the final cut.
//!
//! Cut points are fitted once per filtered dataset and then applied to every
//! row, so assignment is reproducible.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::quantile::{quantile_sorted, sorted_finite};
use crate::error::{LensError, Result};

/// Equal-width bins over `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedWidthBins {
    lower: f64,
    upper: f64,
    count: usize,
}

impl FixedWidthBins {
    pub fn new(lower: f64, upper: f64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(LensError::configuration("bin count must be at least 1"));
        }
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(LensError::configuration(format!(
                "bin range must be finite and increasing, got [{lower}, {upper}]"
            )));
        }
        Ok(Self {
            lower,
            upper,
            count,
        })
    }

    /// Ten bins over `[0, 1]`, the usual split of a democracy index.
    pub fn deciles() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
            count: 10,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Lower edge of bin `index`; `edge(count)` is the upper bound.
    pub fn edge(&self, index: usize) -> f64 {
        if index >= self.count {
            return self.upper;
        }
        self.lower + (self.upper - self.lower) * index as f64 / self.count as f64
    }

    /// All `count + 1` edges, ascending.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.count).map(|i| self.edge(i)).collect()
    }

    /// The bin holding `value`, or `None` when it lies outside the range or
    /// is not finite.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.lower || value > self.upper {
            return None;
        }
        let last = self.count - 1;
        if value == self.upper {
            return Some(last);
        }

        let scaled = (value - self.lower) / (self.upper - self.lower) * self.count as f64;
        let mut index = (scaled.floor() as usize).min(last);
        // Floating-point division can land one bin off near an edge;
        // settle against the same edges that edges() reports.
        while index > 0 && value < self.edge(index) {
            index -= 1;
        }
        while index < last && value >= self.edge(index + 1) {
            index += 1;
        }
        Some(index)
    }

    pub fn label(&self, index: usize) -> String {
        format!("{:.1}-{:.1}", self.edge(index), self.edge(index + 1))
    }
}

/// Cut points taken from sample quantiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileCuts {
    cuts: Vec<f64>,
}

impl QuantileCuts {
    /// Fits cut points at `probabilities`, which must be ascending and lie in
    /// `[0, 1]`.
    ///
    /// With no finite values in `sample` there is nothing to cut and every
    /// value falls in a single bucket.
    pub fn from_sample(sample: &[f64], probabilities: &[f64]) -> Result<Self> {
        validate_probabilities(probabilities)?;
        let sorted = sorted_finite(sample);
        let cuts = probabilities
            .iter()
            .filter_map(|&p| quantile_sorted(&sorted, p))
            .collect();
        Ok(Self { cuts })
    }

    /// Uses explicit cut points.
    pub fn from_cuts(mut cuts: Vec<f64>) -> Result<Self> {
        if cuts.iter().any(|c| !c.is_finite()) {
            return Err(LensError::configuration("cut points must be finite"));
        }
        cuts.sort_by(f64::total_cmp);
        Ok(Self { cuts })
    }

    pub fn terciles(sample: &[f64]) -> Result<Self> {
        Self::from_sample(sample, &[1.0 / 3.0, 2.0 / 3.0])
    }

    pub fn quartiles(sample: &[f64]) -> Result<Self> {
        Self::from_sample(sample, &[0.25, 0.5, 0.75])
    }

    pub fn deciles(sample: &[f64]) -> Result<Self> {
        let probabilities: Vec<f64> = (1..10).map(|i| f64::from(i) / 10.0).collect();
        Self::from_sample(sample, &probabilities)
    }

    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    pub fn bucket_count(&self) -> usize {
        self.cuts.len() + 1
    }

    /// The first bucket whose upper cut is at least `value`; the last bucket
    /// for anything above every cut.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        Some(
            self.cuts
                .iter()
                .position(|&cut| value <= cut)
                .unwrap_or(self.cuts.len()),
        )
    }
}

fn validate_probabilities(probabilities: &[f64]) -> Result<()> {
    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(LensError::configuration(format!(
            "quantile probability {p} is outside [0, 1]"
        )));
    }
    if probabilities.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(LensError::configuration(
            "quantile probabilities must be ascending",
        ));
    }
    Ok(())
}

/// How a chart partitions a variable, as passed in from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BinStrategy {
    FixedWidth {
        lower: f64,
        upper: f64,
        count: usize,
    },
    Quantile {
        probabilities: Vec<f64>,
    },
}

impl BinStrategy {
    pub fn deciles() -> Self {
        BinStrategy::FixedWidth {
            lower: 0.0,
            upper: 1.0,
            count: 10,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            BinStrategy::FixedWidth {
                lower,
                upper,
                count,
            } => FixedWidthBins::new(*lower, *upper, *count).map(|_| ()),
            BinStrategy::Quantile { probabilities } => validate_probabilities(probabilities),
        }
    }

    /// Fixes cut points against `sample`.
    pub fn fit(&self, sample: &[f64]) -> Result<Bucketer> {
        match self {
            BinStrategy::FixedWidth {
                lower,
                upper,
                count,
            } => Ok(Bucketer::Fixed(FixedWidthBins::new(*lower, *upper, *count)?)),
            BinStrategy::Quantile { probabilities } => Ok(Bucketer::Quantile(
                QuantileCuts::from_sample(sample, probabilities)?,
            )),
        }
    }
}

/// A fitted bucketing, ready to assign values.
#[derive(Debug, Clone, PartialEq)]
pub enum Bucketer {
    Fixed(FixedWidthBins),
    Quantile(QuantileCuts),
}

impl Bucketer {
    pub fn assign(&self, value: f64) -> Option<usize> {
        match self {
            Bucketer::Fixed(bins) => bins.assign(value),
            Bucketer::Quantile(cuts) => cuts.assign(value),
        }
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Bucketer::Fixed(bins) => bins.count(),
            Bucketer::Quantile(cuts) => cuts.bucket_count(),
        }
    }

    pub fn label(&self, index: usize) -> String {
        match self {
            Bucketer::Fixed(bins) => bins.label(index),
            Bucketer::Quantile(_) => format!("Q{}", index + 1),
        }
    }
}

/// Income group from per-capita GDP quartiles of the filtered sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeGroup {
    Low,
    LowerMiddle,
    UpperMiddle,
    High,
}

impl IncomeGroup {
    /// Richest first, the order facets are laid out in.
    pub const DISPLAY_ORDER: [IncomeGroup; 4] = [
        IncomeGroup::High,
        IncomeGroup::UpperMiddle,
        IncomeGroup::LowerMiddle,
        IncomeGroup::Low,
    ];

    fn from_quartile(index: usize) -> Option<Self> {
        match index {
            0 => Some(IncomeGroup::Low),
            1 => Some(IncomeGroup::LowerMiddle),
            2 => Some(IncomeGroup::UpperMiddle),
            3 => Some(IncomeGroup::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeGroup::Low => "Low Income",
            IncomeGroup::LowerMiddle => "Lower-Middle",
            IncomeGroup::UpperMiddle => "Upper-Middle",
            IncomeGroup::High => "High Income",
        }
    }
}

impl fmt::Display for IncomeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quartile cuts over per-capita GDP, mapping values to [`IncomeGroup`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeGroups {
    cuts: QuantileCuts,
}

impl IncomeGroups {
    pub fn from_sample(gdppc: &[f64]) -> Result<Self> {
        Ok(Self {
            cuts: QuantileCuts::quartiles(gdppc)?,
        })
    }

    pub fn cuts(&self) -> &[f64] {
        self.cuts.cuts()
    }

    /// `None` for an absent income figure; such rows belong to no facet.
    pub fn classify(&self, gdppc: Option<f64>) -> Option<IncomeGroup> {
        self.cuts
            .assign(gdppc?)
            .and_then(IncomeGroup::from_quartile)
    }
}
