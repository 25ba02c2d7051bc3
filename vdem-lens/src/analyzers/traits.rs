//! Core accumulator trait for the analyzer framework.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for analyzer state that supports incremental computation.
///
/// Every summary statistic in this crate is computed by pushing values into a
/// state and reading the metric out of it. States for disjoint subsets can be
/// merged, which is how grouped summaries and per-facet regressions are
/// assembled without a second pass over the rows.
///
/// # Example
///
/// ```rust
/// use vdem_lens::analyzers::{AnalyzerState, MeanState};
///
/// let mut left = MeanState::default();
/// left.push(1.0);
/// let mut right = MeanState::default();
/// right.push(3.0);
///
/// let merged = MeanState::merge(vec![left, right]);
/// assert_eq!(merged.mean(), Some(2.0));
/// ```
pub trait AnalyzerState:
    Clone + Debug + Default + Serialize + for<'de> Deserialize<'de>
{
    /// Combines this state with another computed over disjoint input.
    fn combine(self, other: &Self) -> Self;

    /// Merges multiple states into a single state.
    fn merge(states: Vec<Self>) -> Self {
        states
            .iter()
            .fold(Self::default(), |acc, state| acc.combine(state))
    }

    /// Returns whether this state has seen no usable input.
    fn is_empty(&self) -> bool;
}
