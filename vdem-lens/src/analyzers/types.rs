//! Result types shared by the analyzers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A statistic that is either computed or explicitly unavailable.
///
/// Render-ready summaries use this instead of a bare `Option` so that an
/// empty bucket serializes as `{"status": "no_data"}` and can never be read
/// as zero by a consumer that treats `null` loosely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate {
    Value(f64),
    NoData,
}

impl Estimate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Value(v) => Some(*v),
            Estimate::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Estimate::NoData)
    }
}

impl From<Option<f64>> for Estimate {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Estimate::Value(v),
            _ => Estimate::NoData,
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Value(v) => write!(f, "{v:.1}"),
            Estimate::NoData => f.write_str("-"),
        }
    }
}

/// Keeps only finite values, dropping absent and non-finite entries.
pub fn finite_values<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}
