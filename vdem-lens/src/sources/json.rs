//! Pre-shaped JSON array source.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::normalize::{Normalizer, RawRecord, RawValue};
use super::{ColumnMapping, LoadOutcome, PanelSource};
use crate::error::{LensError, Result};
use crate::logging::LogConfig;

impl RawRecord for Map<String, Value> {
    fn get(&self, column: &str) -> RawValue<'_> {
        match Map::get(self, column) {
            None => RawValue::Missing,
            Some(Value::Null) => RawValue::Null,
            Some(Value::String(text)) => RawValue::Text(text),
            Some(Value::Number(number)) => number.as_f64().map_or(RawValue::Other, RawValue::Number),
            Some(_) => RawValue::Other,
        }
    }
}

/// Normalizes a JSON document holding an array of record objects.
///
/// Numbers and numeric strings are both accepted per field and `null` is
/// absent. Array elements that are not objects are dropped as malformed.
/// The document itself must be an array, and when it has records at least
/// one of them must carry the entity and year columns.
pub fn parse_json_records(
    text: &str,
    mapping: &ColumnMapping,
    source_name: &str,
    log_config: &LogConfig,
) -> Result<LoadOutcome> {
    mapping.validate()?;
    let document: Value = serde_json::from_str(text)
        .map_err(|e| LensError::load_with_source(source_name, "invalid JSON document", e))?;
    let Value::Array(records) = document else {
        return Err(LensError::load(
            source_name,
            "expected a JSON array of records",
        ));
    };

    let objects: Vec<&Map<String, Value>> = records.iter().filter_map(Value::as_object).collect();
    if !objects.is_empty() {
        for required in [&mapping.entity, &mapping.year] {
            if !objects.iter().any(|object| object.contains_key(required)) {
                return Err(LensError::ColumnNotFound {
                    column: required.clone(),
                });
            }
        }
    }

    let mut normalizer =
        Normalizer::new(mapping, source_name).with_log_config(log_config.clone());
    normalizer.set_missing_columns(
        mapping
            .optional_columns()
            .filter(|column| !objects.iter().any(|object| object.contains_key(*column)))
            .map(str::to_string)
            .collect(),
    );

    for record in &records {
        match record.as_object() {
            Some(object) => normalizer.push(object),
            None => normalizer.push_malformed(),
        }
    }
    Ok(normalizer.finish())
}

/// A JSON file holding an array of record objects.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: String,
    mapping: ColumnMapping,
    log_config: LogConfig,
}

impl JsonSource {
    pub fn new(path: impl Into<String>, mapping: ColumnMapping) -> Self {
        Self {
            path: path.into(),
            mapping,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }
}

#[async_trait]
impl PanelSource for JsonSource {
    #[instrument(skip(self), fields(source.type = "json", source.path = %self.path))]
    async fn load(&self) -> Result<LoadOutcome> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LensError::load_with_source(&self.path, "file is not readable", e))?;
        let outcome = parse_json_records(&text, &self.mapping, &self.description(), &self.log_config)?;
        info!(
            source.path = %self.path,
            rows.kept = outcome.report.rows_kept,
            rows.dropped = outcome.report.rows_dropped(),
            "JSON panel loaded"
        );
        Ok(outcome)
    }

    fn description(&self) -> String {
        format!("JSON file: {}", self.path)
    }
}
