//! Entity-relative derived fields.
//!
//! Derivation is a pure function of the loaded rows: it never mutates the
//! store and can be rerun whenever a view needs a different configuration.

mod growth;

pub use growth::{derive_growth, growth_rate, GrowthConfig, RollingWindow};
