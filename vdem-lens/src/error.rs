//! Error types for the vdem-lens pipeline.
//!
//! Only structural failures are errors. A missing observation is an
//! `Option::None` that flows through the pipeline, and a statistic that cannot
//! be computed from too few values is reported as an explicit "no data" value
//! by the analyzers rather than as an error.

use thiserror::Error;

/// The main error type for the vdem-lens library.
#[derive(Error, Debug)]
pub enum LensError {
    /// The dataset could not be read or is malformed at the structural level.
    #[error("Failed to load '{source_name}': {message}")]
    Load {
        /// Description of the source (usually its path)
        source_name: String,
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A column the loader needs is not present in the source.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Two rows claim the same entity-year, so the time order is ambiguous.
    #[error("Duplicate observation for '{entity}' in {year}")]
    DuplicateObservation { entity: String, year: i32 },

    /// A weighted aggregation received a weight it cannot use.
    #[error("Invalid weight {weight}: weights must be finite and non-negative")]
    InvalidWeight { weight: f64 },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON (de)serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, LensError>`.
pub type Result<T> = std::result::Result<T, LensError>;

impl LensError {
    /// Creates a new load error.
    pub fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new load error wrapping the underlying cause.
    pub fn load_with_source(
        source_name: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if this error means the dataset itself could not be loaded.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Load { .. }
                | Self::ColumnNotFound { .. }
                | Self::DataFusion(_)
                | Self::Arrow(_)
                | Self::Io(_)
                | Self::Json(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LensError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

fn wrap(msg: &str, base: LensError) -> LensError {
    match base {
        LensError::Load {
            source_name,
            message,
            source,
        } => LensError::Load {
            source_name,
            message: format!("{msg}: {message}"),
            source,
        },
        LensError::Internal(inner) => LensError::Internal(format!("{msg}: {inner}")),
        other => LensError::Internal(format!("{msg}: {other}")),
    }
}
