//! The loaded panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};

use super::filter::YearRange;
use super::row::{DerivedRow, PanelRow};
use crate::derive::{derive_growth, GrowthConfig};
use crate::error::Result;
use crate::sources::{LoadReport, PanelSource};

/// Panel rows loaded once and never modified.
///
/// Views never hold on to the store's rows mutably; every derived structure
/// is recomputed from it, so the same store can back any number of honest
/// and distorted views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelStore {
    rows: Vec<PanelRow>,
    report: LoadReport,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl PanelStore {
    /// Loads every row from `source`.
    #[instrument(skip(source), fields(source = %source.description()))]
    pub async fn load(source: &dyn PanelSource) -> Result<Self> {
        let outcome = source.load().await?;
        let store = Self {
            rows: outcome.rows,
            report: outcome.report,
            source: source.description(),
            loaded_at: Utc::now(),
        };
        info!(
            rows = store.rows.len(),
            entities = store.entities().len(),
            "Panel store ready"
        );
        Ok(store)
    }

    /// Wraps rows that were built in memory.
    pub fn from_rows(rows: Vec<PanelRow>) -> Self {
        let report = LoadReport {
            rows_read: rows.len(),
            rows_kept: rows.len(),
            ..Default::default()
        };
        Self {
            rows,
            report,
            source: "in-memory".to_string(),
            loaded_at: Utc::now(),
        }
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct entity names, sorted.
    pub fn entities(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.country.as_str()).collect()
    }

    /// First and last year present, or `None` for an empty store.
    pub fn year_span(&self) -> Option<YearRange> {
        let start = self.rows.iter().map(|row| row.year).min()?;
        let end = self.rows.iter().map(|row| row.year).max()?;
        Some(YearRange::new(start, end))
    }

    /// Rows with their growth fields derived.
    pub fn derive(&self, config: &GrowthConfig) -> Result<Vec<DerivedRow>> {
        derive_growth(&self.rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ColumnMapping, JsonSource};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn store() -> PanelStore {
        PanelStore::from_rows(vec![
            PanelRow::new("Peru", 2001).with_gdppc(110.0),
            PanelRow::new("Chile", 1999).with_gdppc(50.0),
            PanelRow::new("Peru", 2000).with_gdppc(100.0),
        ])
    }

    #[test]
    fn test_store_summary() {
        let store = store();
        assert_eq!(store.len(), 3);
        assert_eq!(store.entities().into_iter().collect::<Vec<_>>(), vec!["Chile", "Peru"]);
        assert_eq!(store.year_span(), Some(YearRange::new(1999, 2001)));
        assert_eq!(store.report().rows_kept, 3);
        assert_eq!(store.source(), "in-memory");
    }

    #[test]
    fn test_derive_leaves_store_untouched() {
        let store = store();
        let derived = store.derive(&GrowthConfig::default()).unwrap();
        assert_eq!(derived.len(), 3);
        assert_eq!(derived[2].country(), "Peru");
        assert!((derived[2].gdppc_growth.unwrap() - 10.0).abs() < 1e-9);
        // Input order is preserved in the store
        assert_eq!(store.rows()[0].year, 2001);
    }

    #[test]
    fn test_empty_store() {
        let store = PanelStore::from_rows(Vec::new());
        assert!(store.is_empty());
        assert_eq!(store.year_span(), None);
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"[{{"country": "Chile", "year": 1990}}]"#).unwrap();
        file.flush().unwrap();

        let source = JsonSource::new(file.path().to_str().unwrap(), ColumnMapping::lite());
        let before = Utc::now();
        let store = PanelStore::load(&source).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.loaded_at() >= before);
        assert!(store.source().contains("JSON file"));
    }
}
