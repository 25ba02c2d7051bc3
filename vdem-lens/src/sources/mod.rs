//! Panel data sources.
//!
//! A source reads raw tabular records and hands them to the normalizer,
//! which turns them into [`PanelRow`]s. Delimited text is read through
//! DataFusion; pre-shaped JSON arrays are read with `serde_json`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::core::row::PanelRow;
use crate::error::{LensError, Result};

mod csv;
mod json;
pub mod normalize;

pub use csv::{CsvOptions, CsvSource};
pub use json::{parse_json_records, JsonSource};
pub use normalize::{normalize_entity, Normalizer, RawRecord, RawValue};

/// A source of country-year panel rows.
///
/// # Examples
///
/// ```rust,no_run
/// use vdem_lens::sources::{ColumnMapping, CsvSource, PanelSource};
///
/// # async fn example() -> vdem_lens::error::Result<()> {
/// let source = CsvSource::new("data/V-Dem-CY-Full+Others-v15.csv", ColumnMapping::vdem());
/// let outcome = source.load().await?;
/// println!("{}: kept {} rows", source.description(), outcome.report.rows_kept);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PanelSource: Debug + Send + Sync {
    /// Reads and normalizes every record.
    ///
    /// Fails only when the source as a whole is unusable: unreadable, not
    /// parseable, or missing the entity or year column. Individual bad
    /// records are dropped and counted in the report.
    async fn load(&self) -> Result<LoadOutcome>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

/// Rows read from a source together with what happened to the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub rows: Vec<PanelRow>,
    pub report: LoadReport,
}

/// Why a record did not become a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingEntity,
    UnparseableYear,
    DuplicateEntityYear,
    /// A JSON array element that is not an object.
    Malformed,
}

/// Counts collected while normalizing a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped: BTreeMap<DropReason, usize>,
    /// Records whose entity name was rewritten by the alias table.
    pub entities_renamed: usize,
    /// Non-empty cells that could not be read as a number and became absent.
    pub fields_coerced: usize,
    /// Mapped optional columns the source does not have.
    pub missing_columns: Vec<String>,
}

impl LoadReport {
    pub fn rows_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }
}

/// Names of the source columns that feed each row field.
///
/// The entity and year columns are required; a source without them fails
/// to load. Optional columns missing from a source leave their field absent
/// on every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub entity: String,
    pub year: String,
    pub polyarchy: Option<String>,
    pub gdp: Option<String>,
    pub gdppc: Option<String>,
    pub population: Option<String>,
    pub gdp_growth: Option<String>,
    pub inflation: Option<String>,
    pub regime: Option<String>,
    pub region: Option<String>,
    /// Multiplier taking the population column to persons.
    pub population_scale: f64,
}

impl ColumnMapping {
    /// Column names of the published V-Dem country-year file, which reports
    /// population in millions.
    pub fn vdem() -> Self {
        Self {
            entity: "country_name".to_string(),
            year: "year".to_string(),
            polyarchy: Some("v2x_polyarchy".to_string()),
            gdp: Some("e_gdp".to_string()),
            gdppc: Some("e_gdppc".to_string()),
            population: Some("e_pop".to_string()),
            gdp_growth: Some("e_gdp_growth".to_string()),
            inflation: Some("e_miinflat".to_string()),
            regime: Some("v2x_regime".to_string()),
            region: Some("e_regionpol_6C".to_string()),
            population_scale: 1_000_000.0,
        }
    }

    /// Column names of a pre-shaped extract with population in persons.
    pub fn lite() -> Self {
        Self {
            entity: "country".to_string(),
            year: "year".to_string(),
            polyarchy: Some("polyarchy".to_string()),
            gdp: Some("gdp".to_string()),
            gdppc: Some("gdppc".to_string()),
            population: Some("population".to_string()),
            gdp_growth: Some("gdpGrowth".to_string()),
            inflation: Some("inflation".to_string()),
            regime: Some("regime".to_string()),
            region: Some("region".to_string()),
            population_scale: 1.0,
        }
    }

    pub fn with_population_scale(mut self, scale: f64) -> Self {
        self.population_scale = scale;
        self
    }

    /// Fails when the population scale is not a finite positive multiplier.
    pub fn validate(&self) -> Result<()> {
        if !self.population_scale.is_finite() || self.population_scale <= 0.0 {
            return Err(LensError::configuration(format!(
                "population_scale must be finite and positive, got {}",
                self.population_scale
            )));
        }
        Ok(())
    }

    /// Every mapped column, required ones first.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![self.entity.as_str(), self.year.as_str()];
        columns.extend(self.optional_columns());
        columns
    }

    pub fn optional_columns(&self) -> impl Iterator<Item = &str> {
        [
            &self.polyarchy,
            &self.gdp,
            &self.gdppc,
            &self.population,
            &self.gdp_growth,
            &self.inflation,
            &self.regime,
            &self.region,
        ]
        .into_iter()
        .filter_map(|column| column.as_deref())
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::vdem()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_presets() {
        let vdem = ColumnMapping::vdem();
        assert_eq!(vdem.population_scale, 1_000_000.0);
        assert_eq!(vdem.columns()[..2], ["country_name", "year"]);
        assert_eq!(vdem.optional_columns().count(), 8);

        let lite = ColumnMapping::lite();
        assert_eq!(lite.population_scale, 1.0);
        assert!(lite.columns().contains(&"gdpGrowth"));
    }

    #[test]
    fn test_population_scale_validation() {
        assert!(ColumnMapping::vdem().validate().is_ok());
        for scale in [0.0, -1.0e6, f64::INFINITY, f64::NAN] {
            let err = ColumnMapping::lite()
                .with_population_scale(scale)
                .validate()
                .unwrap_err();
            assert!(matches!(err, LensError::Configuration(_)), "scale {scale}");
        }
    }

    #[test]
    fn test_unmapped_columns_are_skipped() {
        let mut mapping = ColumnMapping::lite();
        mapping.inflation = None;
        mapping.region = None;
        assert_eq!(mapping.optional_columns().count(), 6);
    }

    #[test]
    fn test_report_counts_drops() {
        let mut report = LoadReport::default();
        report.record_drop(DropReason::UnparseableYear);
        report.record_drop(DropReason::UnparseableYear);
        report.record_drop(DropReason::MissingEntity);
        assert_eq!(report.rows_dropped(), 3);
        assert_eq!(report.dropped_for(DropReason::UnparseableYear), 2);
        assert_eq!(report.dropped_for(DropReason::DuplicateEntityYear), 0);
    }
}
