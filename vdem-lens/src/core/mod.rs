//! Panel rows, the loaded store and row filters.
//!
//! ## Overview
//!
//! - **[`PanelRow`]**: one country-year observation, every number optional
//! - **[`DerivedRow`]**: a row plus its growth fields
//! - **[`PanelStore`]**: rows loaded once and never modified
//! - **[`RowFilter`]**: year, cohort and completeness criteria for a view
//!
//! ## Data flow
//!
//! ```text
//! PanelSource ──load──▶ PanelStore ──derive──▶ [DerivedRow] ──RowFilter──▶ chart view
//! ```

pub mod filter;
pub mod row;
pub mod store;

pub use filter::{RowFilter, YearRange};
pub use row::{DerivedRow, Field, PanelRow, Regime};
pub use store::PanelStore;
