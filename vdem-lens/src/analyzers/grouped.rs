//! Keyed grouping with per-group averages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mean::{GeometricMeanState, MeanState, WeightedMeanState};
use super::traits::AnalyzerState;
use super::types::Estimate;

/// How the values of a group are reduced to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    Arithmetic,
    PopulationWeighted,
    /// Compound average; values are read as percent growth rates.
    Geometric,
}

/// Accumulates one group under every averaging at once.
///
/// Every averaging sees the same observations: one with a negative or
/// non-finite weight is left out of all of them and counted in `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupAccumulator {
    pub arithmetic: MeanState,
    pub weighted: WeightedMeanState,
    pub geometric: GeometricMeanState,
    pub skipped: u64,
}

impl GroupAccumulator {
    /// Adds a value with an optional weight (absent counts as 1). Returns
    /// whether the observation was accumulated.
    pub fn push(&mut self, value: f64, weight: Option<f64>) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.weighted.push(value, weight).is_err() {
            self.skipped += 1;
            return false;
        }
        self.arithmetic.push(value);
        self.geometric.push_growth(value);
        true
    }

    pub fn count(&self) -> u64 {
        self.arithmetic.count
    }

    pub fn estimate(&self, averaging: Averaging) -> Estimate {
        match averaging {
            Averaging::Arithmetic => self.arithmetic.mean(),
            Averaging::PopulationWeighted => self.weighted.mean(),
            Averaging::Geometric => self.geometric.mean_growth(),
        }
        .into()
    }

    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            count: self.count(),
            skipped: self.skipped,
            arithmetic: self.estimate(Averaging::Arithmetic),
            weighted: self.estimate(Averaging::PopulationWeighted),
            geometric: self.estimate(Averaging::Geometric),
        }
    }
}

impl AnalyzerState for GroupAccumulator {
    fn combine(self, other: &Self) -> Self {
        Self {
            arithmetic: self.arithmetic.combine(&other.arithmetic),
            weighted: self.weighted.combine(&other.weighted),
            geometric: self.geometric.combine(&other.geometric),
            skipped: self.skipped + other.skipped,
        }
    }

    fn is_empty(&self) -> bool {
        self.arithmetic.is_empty()
    }
}

/// Every average of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub count: u64,
    pub skipped: u64,
    pub arithmetic: Estimate,
    pub weighted: Estimate,
    pub geometric: Estimate,
}

impl GroupSummary {
    pub fn get(&self, averaging: Averaging) -> Estimate {
        match averaging {
            Averaging::Arithmetic => self.arithmetic,
            Averaging::PopulationWeighted => self.weighted,
            Averaging::Geometric => self.geometric,
        }
    }
}

/// Groups `items` by `key`, preserving input order within each group.
/// Items for which `key` returns `None` are left out.
pub fn group_by<'a, T, K, F>(items: impl IntoIterator<Item = &'a T>, key: F) -> BTreeMap<K, Vec<&'a T>>
where
    T: 'a,
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut groups: BTreeMap<K, Vec<&'a T>> = BTreeMap::new();
    for item in items {
        if let Some(k) = key(item) {
            groups.entry(k).or_default().push(item);
        }
    }
    groups
}

/// Accumulates `(key, value, weight)` observations into per-key groups.
///
/// A key whose every observation was skipped still gets a group, with a
/// zero count and its `skipped` tally.
pub fn accumulate<K, I>(observations: I) -> BTreeMap<K, GroupAccumulator>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64, Option<f64>)>,
{
    let mut groups: BTreeMap<K, GroupAccumulator> = BTreeMap::new();
    for (key, value, weight) in observations {
        groups.entry(key).or_default().push(value, weight);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_reports_every_average() {
        let mut acc = GroupAccumulator::default();
        assert!(acc.push(10.0, Some(1.0)));
        assert!(acc.push(-10.0, Some(3.0)));

        let summary = acc.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.arithmetic, Estimate::Value(0.0));
        assert_eq!(summary.weighted, Estimate::Value(-5.0));
        let geometric = summary.geometric.value().unwrap();
        assert!((geometric - ((1.1f64 * 0.9).sqrt() - 1.0) * 100.0).abs() < 1e-9);
        assert_eq!(summary.get(Averaging::PopulationWeighted), summary.weighted);
    }

    #[test]
    fn test_empty_group_is_no_data() {
        let summary = GroupAccumulator::default().summary();
        assert_eq!(summary.count, 0);
        assert!(summary.arithmetic.is_no_data());
        assert!(summary.weighted.is_no_data());
        assert!(summary.geometric.is_no_data());
    }

    #[test]
    fn test_unusable_weight_skips_observation_everywhere() {
        let groups = accumulate(vec![
            ("a", 1.0, Some(f64::NAN)),
            ("a", 4.0, Some(2.0)),
            ("a", 90.0, Some(-3.0)),
            ("a", 8.0, Some(f64::INFINITY)),
            ("b", 5.0, Some(-1.0)),
        ]);

        let summary = groups[&"a"].summary();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.arithmetic, Estimate::Value(4.0));
        assert_eq!(summary.weighted, Estimate::Value(4.0));

        let empty = groups[&"b"].summary();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.skipped, 1);
        assert!(empty.arithmetic.is_no_data());
    }

    #[test]
    fn test_collapse_makes_geometric_no_data() {
        let mut acc = GroupAccumulator::default();
        assert!(acc.push(-150.0, None));
        assert!(acc.push(50.0, None));

        let summary = acc.summary();
        assert_eq!(summary.arithmetic, Estimate::Value(-50.0));
        assert!(summary.geometric.is_no_data());
    }

    #[test]
    fn test_accumulate_by_key() {
        let groups = accumulate(vec![(2, 4.0, None), (1, 1.0, None), (2, 6.0, None)]);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(groups[&2].estimate(Averaging::Arithmetic), Estimate::Value(5.0));
    }

    #[test]
    fn test_group_by_skips_unkeyed_items() {
        let words = ["apple", "avocado", "", "banana"];
        let groups = group_by(words.iter(), |w| w.chars().next());
        assert_eq!(groups[&'a'], vec![&"apple", &"avocado"]);
        assert_eq!(groups[&'b'].len(), 1);
        assert_eq!(groups.len(), 2);
    }
}
