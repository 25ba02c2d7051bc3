//! Summary statistics used by the chart views.
//!
//! Every analyzer ignores absent inputs and reports degenerate cases as
//! explicit values (`None`, [`Estimate::NoData`], an insufficient
//! [`RegressionFit`]) rather than errors, so one empty group never aborts a
//! whole chart.
//!
//! ## Available Analyzers
//!
//! - **Quantiles** (`quantile`): R-7 quantiles and quantile-trimmed domains
//! - **Means** (`mean`): arithmetic, weighted and geometric (compounding) means
//! - **Distributions** (`distribution`): box summaries with Tukey whiskers
//! - **Bucketing** (`bucketing`): fixed-width bins, quantile cuts, income groups
//! - **Grouping** (`grouped`): keyed groups summarized under each averaging
//! - **Regression** (`regression`): least-squares trend lines from running sums
//!
//! Accumulating states implement [`AnalyzerState`], so partial results for
//! disjoint subsets can be merged.
//!
//! ## Example Usage
//!
//! ```rust
//! use vdem_lens::analyzers::{accumulate, Averaging, FixedWidthBins};
//!
//! let bins = FixedWidthBins::deciles();
//! let rows = [(0.12, 3.0, Some(5.0e6)), (0.18, 1.0, Some(1.0e6)), (0.85, 1.5, None)];
//!
//! let groups = accumulate(
//!     rows.iter()
//!         .filter_map(|&(index, growth, pop)| Some((bins.assign(index)?, growth, pop))),
//! );
//!
//! let weighted = groups[&1].estimate(Averaging::PopulationWeighted);
//! assert!((weighted.value().unwrap() - 16.0 / 6.0).abs() < 1e-9);
//! assert!(!groups.contains_key(&5));
//! ```

pub mod bucketing;
pub mod distribution;
pub mod grouped;
pub mod mean;
pub mod quantile;
pub mod regression;
pub mod traits;
pub mod types;

pub use bucketing::{BinStrategy, Bucketer, FixedWidthBins, IncomeGroup, IncomeGroups, QuantileCuts};
pub use distribution::BoxSummary;
pub use grouped::{accumulate, group_by, Averaging, GroupAccumulator, GroupSummary};
pub use mean::{
    arithmetic_mean_growth, geometric_mean_growth, mean, weighted_mean, GeometricMeanState,
    MeanState, WeightedMeanState,
};
pub use quantile::{quantile, quantile_sorted, quantiles, sorted_finite, TrimmedDomain};
pub use regression::{fit_line, RegressionFit, RegressionState};
pub use traits::AnalyzerState;
pub use types::{finite_values, Estimate};
