//! # vdem-lens - Honest and Misleading Views of the V-Dem Panel
//!
//! vdem-lens loads the V-Dem country-year panel (democracy indices next to
//! GDP, population and growth figures), derives per-capita growth within each
//! country's history, and computes the statistics behind a set of charts.
//! Every chart comes in two presets over the same rows: an honest one and a
//! distorted one whose tricks (truncated or inverted axes, a cherry-picked
//! window, an unweighted mean over the wrong measure) are spelled out in its
//! configuration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vdem_lens::prelude::*;
//! use vdem_lens::charts::{Chart, PriceOfLiberty};
//! use vdem_lens::sources::{ColumnMapping, CsvSource};
//!
//! # async fn example() -> vdem_lens::error::Result<()> {
//! let source = CsvSource::new("data/vdem.csv", ColumnMapping::vdem());
//! let store = PanelStore::load(&source).await?;
//! println!("{} rows kept, {} dropped", store.report().rows_kept, store.report().rows_dropped());
//!
//! let rows = store.derive(&GrowthConfig::default())?;
//! let comparison = PriceOfLiberty::compare(&rows)?;
//! println!(
//!     "honest slope {:.2}, distorted slope {:.2}",
//!     comparison.honest.fit.slope, comparison.distorted.fit.slope
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! CSV / JSON ──sources──▶ PanelStore ──derive──▶ [DerivedRow] ──charts──▶ summaries
//!                                                      │
//!                                                 analyzers
//! ```
//!
//! - **`sources`**: CSV (via DataFusion) and JSON loaders with name
//!   normalization and a per-load drop report
//! - **`core`**: panel rows, the immutable store and row filters
//! - **`derive`**: per-capita growth and its rolling mean, per entity
//! - **`analyzers`**: quantiles, means, box summaries, bucketing, regression
//! - **`charts`**: one pure function per chart, from rows and a config to a
//!   serializable summary
//!
//! Missing observations are `None` all the way through and never become
//! zero. Statistics that cannot be computed from the data at hand are
//! reported as explicit "no data" values rather than errors.

pub mod analyzers;
pub mod charts;
pub mod core;
pub mod derive;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod sources;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
