//! "Turbulence of Transition": one country's democracy and growth series
//! drawn against two independent y axes.
//!
//! With two axes the crossing point of the lines is entirely a product of
//! the chosen domains. The distorted preset truncates the democracy axis,
//! turns the growth axis upside down and shortens the window, so a small
//! slide in democracy reads as a collapse mirrored by an economic rebound.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use super::{count_clipped, AxisDomain, Chart, ChartConfig, ChartVariant};
use crate::core::filter::YearRange;
use crate::core::row::{DerivedRow, Field};
use crate::error::{LensError, Result};

/// Entities tried in order when no entity is configured.
pub const PREFERRED_ENTITIES: [&str; 5] = [
    "India",
    "Brazil",
    "United States of America",
    "South Africa",
    "Indonesia",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualAxisConfig {
    pub variant: ChartVariant,
    /// Fixed entity; when unset one is picked with [`select_entity`].
    pub entity: Option<String>,
    pub preferred: Vec<String>,
    pub years: YearRange,
    pub left_field: Field,
    pub right_field: Field,
    pub left_axis: AxisDomain,
    pub right_axis: AxisDomain,
    /// The full range each series can take, against which truncation is
    /// measured.
    pub left_natural: AxisDomain,
    pub right_natural: AxisDomain,
}

impl ChartConfig for DualAxisConfig {
    fn honest() -> Self {
        Self {
            variant: ChartVariant::Honest,
            entity: None,
            preferred: PREFERRED_ENTITIES.iter().map(|s| s.to_string()).collect(),
            years: YearRange::new(2000, 2019),
            left_field: Field::Polyarchy,
            right_field: Field::GdpGrowth,
            left_axis: AxisDomain::new(0.0, 1.0),
            right_axis: AxisDomain::new(0.0, 10.0),
            left_natural: AxisDomain::new(0.0, 1.0),
            right_natural: AxisDomain::new(0.0, 10.0),
        }
    }

    fn distorted() -> Self {
        Self {
            variant: ChartVariant::Distorted,
            entity: Some("India".to_string()),
            years: YearRange::new(2014, 2019),
            left_axis: AxisDomain::new(0.4, 0.65),
            right_axis: AxisDomain::new(2.0, 7.0).inverted(),
            ..Self::honest()
        }
    }

    fn variant(&self) -> ChartVariant {
        self.variant
    }

    fn validate(&self) -> Result<()> {
        self.years.validate()?;
        self.left_axis.validate()?;
        self.right_axis.validate()?;
        self.left_natural.validate()?;
        self.right_natural.validate()
    }
}

impl DualAxisConfig {
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_years(mut self, start: i32, end: i32) -> Self {
        self.years = YearRange::new(start, end);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// What an axis shows relative to its natural range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisReport {
    pub domain: AxisDomain,
    pub natural: AxisDomain,
    /// Domain span over natural span; 1 for an honest full-range axis.
    pub share_of_natural: Option<f64>,
    /// How many times larger a change looks than on the natural axis.
    pub amplification: Option<f64>,
    /// Points drawn off-canvas.
    pub clipped: usize,
}

impl AxisReport {
    fn new(domain: AxisDomain, natural: AxisDomain, values: &[SeriesPoint]) -> Self {
        let share_of_natural = domain.share_of(&natural);
        Self {
            domain,
            natural,
            share_of_natural,
            amplification: share_of_natural.filter(|s| *s > 0.0).map(|s| 1.0 / s),
            clipped: count_clipped(values.iter().map(|p| p.value), Some(&domain)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualAxisSummary {
    pub variant: ChartVariant,
    /// `None` when no entity has data in the window.
    pub entity: Option<String>,
    pub years: YearRange,
    pub left: Vec<SeriesPoint>,
    pub right: Vec<SeriesPoint>,
    pub left_axis: AxisReport,
    pub right_axis: AxisReport,
}

/// Picks the entity to plot: the first of `preferred` with a democracy
/// reading inside `years`, otherwise the entity with the most such
/// readings (alphabetically first on ties).
pub fn select_entity(rows: &[DerivedRow], preferred: &[String], years: YearRange) -> Option<String> {
    let mut coverage: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        if years.contains(row.year()) && row.row.polyarchy.is_some() {
            *coverage.entry(row.country()).or_default() += 1;
        }
    }

    if let Some(name) = preferred.iter().find(|name| coverage.contains_key(name.as_str())) {
        return Some(name.clone());
    }

    // max_by_key keeps the last maximum, so walk names in reverse
    coverage
        .iter()
        .rev()
        .max_by_key(|(_, count)| **count)
        .map(|(name, _)| name.to_string())
}

/// Builds the dual-axis time series.
#[instrument(skip(rows, config), fields(rows = rows.len(), variant = %config.variant))]
pub fn turbulence_of_transition(rows: &[DerivedRow], config: &DualAxisConfig) -> Result<DualAxisSummary> {
    config.validate()?;
    if config.left_field == config.right_field {
        return Err(LensError::configuration(format!(
            "both axes plot {}",
            config.left_field
        )));
    }

    let entity = match &config.entity {
        Some(name) => Some(name.clone()),
        None => select_entity(rows, &config.preferred, config.years),
    };

    let mut series: Vec<&DerivedRow> = match &entity {
        Some(name) => rows
            .iter()
            .filter(|row| row.country() == name && config.years.contains(row.year()))
            .filter(|row| row.value(config.left_field).is_some())
            .collect(),
        None => Vec::new(),
    };
    series.sort_by_key(|row| row.year());

    if series.is_empty() {
        warn!(entity = ?entity, "No series data in window");
    }

    let points = |field: Field| -> Vec<SeriesPoint> {
        series
            .iter()
            .filter_map(|row| {
                Some(SeriesPoint {
                    year: row.year(),
                    value: row.value(field)?,
                })
            })
            .collect()
    };
    let left = points(config.left_field);
    let right = points(config.right_field);

    let left_axis = AxisReport::new(config.left_axis, config.left_natural, &left);
    let right_axis = AxisReport::new(config.right_axis, config.right_natural, &right);
    debug!(
        entity = ?entity,
        left = left.len(),
        right = right.len(),
        left_amplification = ?left_axis.amplification,
        "Computed dual-axis series"
    );

    Ok(DualAxisSummary {
        variant: config.variant,
        entity,
        years: config.years,
        left,
        right,
        left_axis,
        right_axis,
    })
}

/// Marker type for the dual-axis time series.
pub struct TurbulenceOfTransition;

impl Chart for TurbulenceOfTransition {
    type Config = DualAxisConfig;
    type Summary = DualAxisSummary;

    const NAME: &'static str = "turbulence_of_transition";

    fn summarize(rows: &[DerivedRow], config: &DualAxisConfig) -> Result<DualAxisSummary> {
        turbulence_of_transition(rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::row::PanelRow;

    fn row(country: &str, year: i32, polyarchy: Option<f64>, growth: Option<f64>) -> DerivedRow {
        let mut row = PanelRow::new(country, year);
        row.polyarchy = polyarchy;
        row.gdp_growth = growth;
        DerivedRow::underived(row)
    }

    fn panel() -> Vec<DerivedRow> {
        let mut rows = Vec::new();
        for year in (2000..=2019).rev() {
            let t = f64::from(year - 2000);
            rows.push(row("India", year, Some(0.6 - 0.005 * t), Some(5.0 + 0.1 * t)));
            rows.push(row("Chile", year, Some(0.8), Some(3.0)));
        }
        rows.push(row("India", 2020, Some(0.44), Some(-6.6)));
        rows.push(row("India", 2013, None, Some(6.4)));
        rows
    }

    #[test]
    fn test_select_entity_prefers_list_order() {
        let preferred = vec!["Brazil".to_string(), "Chile".to_string(), "India".to_string()];
        let selected = select_entity(&panel(), &preferred, YearRange::new(2000, 2019));
        assert_eq!(selected.as_deref(), Some("Chile"));
    }

    #[test]
    fn test_select_entity_falls_back_to_coverage() {
        let mut rows = panel();
        rows.push(row("Zambia", 2001, Some(0.3), None));
        let selected = select_entity(&rows, &[], YearRange::new(2000, 2000));
        // Chile and India tie on one reading each; alphabetical order wins
        assert_eq!(selected.as_deref(), Some("Chile"));
        assert_eq!(select_entity(&rows, &[], YearRange::new(1900, 1901)), None);
    }

    #[test]
    fn test_honest_series_are_sorted_and_full_range() {
        let summary = turbulence_of_transition(&panel(), &DualAxisConfig::honest()).unwrap();
        assert_eq!(summary.entity.as_deref(), Some("India"));
        assert_eq!(summary.left.len(), 20);
        assert_eq!(summary.left[0].year, 2000);
        assert_eq!(summary.left[19].year, 2019);
        assert_eq!(summary.left_axis.share_of_natural, Some(1.0));
        assert_eq!(summary.left_axis.clipped, 0);
        assert!(!summary.right_axis.domain.inverted);
    }

    #[test]
    fn test_distorted_truncates_and_inverts() {
        let summary = turbulence_of_transition(&panel(), &DualAxisConfig::distorted()).unwrap();
        assert_eq!(summary.left.len(), 6);
        assert_eq!(summary.left[0].year, 2014);

        let share = summary.left_axis.share_of_natural.unwrap();
        assert!((share - 0.25).abs() < 1e-12);
        assert!((summary.left_axis.amplification.unwrap() - 4.0).abs() < 1e-9);
        assert!(summary.right_axis.domain.inverted);
        assert!((summary.right_axis.share_of_natural.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_growth_series_needs_a_democracy_reading() {
        // 2013 has growth but no polyarchy, so it is not part of the series
        let config = DualAxisConfig::honest().with_entity("India").with_years(2013, 2014);
        let summary = turbulence_of_transition(&panel(), &config).unwrap();
        assert_eq!(summary.right.len(), 1);
        assert_eq!(summary.right[0].year, 2014);
    }

    #[test]
    fn test_unknown_entity_yields_empty_series() {
        let config = DualAxisConfig::honest().with_entity("Atlantis");
        let summary = turbulence_of_transition(&panel(), &config).unwrap();
        assert!(summary.left.is_empty());
        assert!(summary.right.is_empty());
    }

    #[test]
    fn test_same_field_on_both_axes_is_rejected() {
        let mut config = DualAxisConfig::honest();
        config.right_field = Field::Polyarchy;
        assert!(turbulence_of_transition(&panel(), &config).is_err());
    }
}
