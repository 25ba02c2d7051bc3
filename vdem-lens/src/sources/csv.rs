//! Delimited text source read through DataFusion.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field as ArrowField, Schema};
use async_trait::async_trait;
use datafusion::prelude::{CsvReadOptions, SessionContext};
use std::path::Path;
use tracing::{info, instrument};

use super::normalize::{Normalizer, RawRecord, RawValue};
use super::{ColumnMapping, LoadOutcome, PanelSource};
use crate::error::{ErrorContext, LensError, Result};
use crate::{log_data_op, perf_debug};
use crate::logging::LogConfig;

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Escape character (default: None)
    pub escape: Option<u8>,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
    /// Maximum records to read when discovering the header
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            escape: None,
            comment: None,
            schema_infer_max_records: 1000,
        }
    }
}

impl CsvOptions {
    /// Tab-separated values.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Default::default()
        }
    }
}

/// A delimited file of country-year records.
///
/// Every column is read as text. Type inference would turn a column with a
/// stray "NA" into strings and a clean column into integers; reading text
/// leaves each cell's interpretation to the normalizer, which applies the
/// same rules to every source.
///
/// # Examples
///
/// ```rust,no_run
/// use vdem_lens::sources::{ColumnMapping, CsvOptions, CsvSource, PanelSource};
///
/// # async fn example() -> vdem_lens::error::Result<()> {
/// let source = CsvSource::with_options("data/extract.tsv", ColumnMapping::lite(), CsvOptions::tsv());
/// let outcome = source.load().await?;
/// assert!(outcome.report.rows_kept <= outcome.report.rows_read);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: String,
    mapping: ColumnMapping,
    options: CsvOptions,
    log_config: LogConfig,
}

impl CsvSource {
    pub fn new(path: impl Into<String>, mapping: ColumnMapping) -> Self {
        Self::with_options(path, mapping, CsvOptions::default())
    }

    pub fn with_options(path: impl Into<String>, mapping: ColumnMapping, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            mapping,
            options,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    // DataFusion only lists files carrying the expected extension.
    fn file_extension(&self) -> String {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }

    fn read_options<'a>(&self, extension: &'a str) -> CsvReadOptions<'a> {
        let mut options = CsvReadOptions::new()
            .has_header(self.options.has_header)
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .schema_infer_max_records(self.options.schema_infer_max_records)
            .file_extension(extension);
        if let Some(escape) = self.options.escape {
            options = options.escape(escape);
        }
        if let Some(comment) = self.options.comment {
            options = options.comment(comment);
        }
        options
    }

    fn read_error(&self, message: &str, error: datafusion::error::DataFusionError) -> LensError {
        LensError::load_with_source(&self.path, message, error)
    }
}

#[async_trait]
impl PanelSource for CsvSource {
    #[instrument(skip(self), fields(
        source.type = "csv",
        source.path = %self.path,
        csv.delimiter = %self.options.delimiter as char,
        csv.has_header = self.options.has_header
    ))]
    async fn load(&self) -> Result<LoadOutcome> {
        log_data_op!(self.log_config, source.path = %self.path, "Loading CSV panel");
        self.mapping.validate()?;

        tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| LensError::load_with_source(&self.path, "file is not readable", e))?;

        let ctx = SessionContext::new();
        let extension = self.file_extension();

        // First pass only discovers the header.
        let header = ctx
            .read_csv(self.path.as_str(), self.read_options(&extension))
            .await
            .map_err(|e| self.read_error("could not read header", e))?;
        let names: Vec<String> = header
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();

        for required in [&self.mapping.entity, &self.mapping.year] {
            if !names.contains(required) {
                return Err(LensError::ColumnNotFound {
                    column: required.clone(),
                });
            }
        }

        let mut selected: Vec<&str> = Vec::new();
        let mut missing: Vec<String> = Vec::new();
        for column in self.mapping.columns() {
            if names.iter().any(|name| name == column) {
                if !selected.contains(&column) {
                    selected.push(column);
                }
            } else {
                missing.push(column.to_string());
            }
        }
        if !missing.is_empty() {
            perf_debug!(self.log_config, columns = ?missing, "Mapped columns absent from source");
        }

        let text_schema = Schema::new(
            names
                .iter()
                .map(|name| ArrowField::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );
        let batches = ctx
            .read_csv(
                self.path.as_str(),
                self.read_options(&extension).schema(&text_schema),
            )
            .await
            .and_then(|df| df.select_columns(&selected))
            .map_err(|e| self.read_error("could not read records", e))?
            .collect()
            .await
            .map_err(|e| self.read_error("could not read records", e))?;

        let mut normalizer = Normalizer::new(&self.mapping, self.description())
            .with_log_config(self.log_config.clone());
        normalizer.set_missing_columns(missing);

        for batch in &batches {
            let schema = batch.schema();
            let columns = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, column)| -> Result<(String, ArrayRef)> {
                    let text = cast(column.as_ref(), &DataType::Utf8)
                        .with_context(|| format!("casting column '{}' to text", field.name()))?;
                    Ok((field.name().clone(), text))
                })
                .collect::<Result<Vec<_>>>()?;

            for row in 0..batch.num_rows() {
                normalizer.push(&BatchRecord {
                    columns: &columns,
                    row,
                });
            }
        }

        let outcome = normalizer.finish();
        info!(
            source.path = %self.path,
            batches = batches.len(),
            rows.kept = outcome.report.rows_kept,
            rows.dropped = outcome.report.rows_dropped(),
            "CSV panel loaded"
        );
        Ok(outcome)
    }

    fn description(&self) -> String {
        format!("CSV file: {}", self.path)
    }
}

/// One row of a text record batch.
struct BatchRecord<'a> {
    columns: &'a [(String, ArrayRef)],
    row: usize,
}

impl RawRecord for BatchRecord<'_> {
    fn get(&self, column: &str) -> RawValue<'_> {
        let Some((_, array)) = self.columns.iter().find(|(name, _)| name == column) else {
            return RawValue::Missing;
        };
        match array.as_string_opt::<i32>() {
            Some(strings) if strings.is_null(self.row) => RawValue::Null,
            Some(strings) => RawValue::Text(strings.value(self.row)),
            None => RawValue::Other,
        }
    }
}
