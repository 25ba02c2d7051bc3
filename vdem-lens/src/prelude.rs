//! Prelude for commonly used types and traits in vdem-lens.

pub use crate::charts::{Chart, ChartConfig, ChartVariant, Comparison};
pub use crate::core::{DerivedRow, Field, PanelRow, PanelStore, Regime, RowFilter, YearRange};
pub use crate::derive::{derive_growth, GrowthConfig};
pub use crate::error::{ErrorContext, LensError, Result};
pub use crate::logging::LogConfig;
pub use crate::sources::{LoadReport, PanelSource};
