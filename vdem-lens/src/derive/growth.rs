//! Per-entity growth rates and their trailing rolling average.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, instrument};

use crate::core::row::{DerivedRow, PanelRow};
use crate::error::{LensError, Result};

/// Configuration for the growth deriver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Number of computed growth values the rolling average spans.
    pub window: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

impl GrowthConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(LensError::configuration(
                "rolling window must hold at least one value",
            ));
        }
        Ok(())
    }
}

/// Percent change from `previous` to `current`.
///
/// `None` when `previous` is zero or either value is not finite.
pub fn growth_rate(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    let growth = (current - previous) / previous * 100.0;
    growth.is_finite().then_some(growth)
}

/// A bounded window over the most recent values, oldest first.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    /// Creates an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends a value, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean of the current contents.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }
}

/// Adds per-capita GDP growth and its rolling average to every row.
///
/// Rows are grouped by entity and walked in year order. Growth needs the
/// current value and the value of the immediately preceding row, and that
/// previous value must be nonzero. A row without a current value breaks the
/// series: the window is emptied and the next row has no previous value. A
/// row whose growth cannot be computed also empties the window, so the
/// rolling average never averages across a break.
///
/// Output is ordered by entity, then year. Two rows for the same entity-year
/// are rejected because their order would be arbitrary.
///
/// # Examples
///
/// ```rust
/// use vdem_lens::core::PanelRow;
/// use vdem_lens::derive::{derive_growth, GrowthConfig};
///
/// let rows = vec![
///     PanelRow::new("A", 2000).with_gdppc(100.0),
///     PanelRow::new("A", 2001).with_gdppc(110.0),
/// ];
/// let derived = derive_growth(&rows, &GrowthConfig::default()).unwrap();
/// assert_eq!(derived[1].gdppc_growth, Some(10.0));
/// ```
#[instrument(skip(rows), fields(rows = rows.len(), window = config.window))]
pub fn derive_growth(rows: &[PanelRow], config: &GrowthConfig) -> Result<Vec<DerivedRow>> {
    config.validate()?;

    let mut by_entity: BTreeMap<&str, Vec<&PanelRow>> = BTreeMap::new();
    for row in rows {
        by_entity.entry(row.country.as_str()).or_default().push(row);
    }

    let mut output = Vec::with_capacity(rows.len());
    for (entity, mut history) in by_entity {
        history.sort_by_key(|row| row.year);
        if let Some(pair) = history.windows(2).find(|pair| pair[0].year == pair[1].year) {
            return Err(LensError::DuplicateObservation {
                entity: entity.to_string(),
                year: pair[0].year,
            });
        }
        derive_entity(&history, config, &mut output);
    }

    debug!(
        rows.derived = output.len(),
        rows.with_growth = output.iter().filter(|r| r.gdppc_growth.is_some()).count(),
        "Derived growth fields"
    );
    Ok(output)
}

fn derive_entity(history: &[&PanelRow], config: &GrowthConfig, output: &mut Vec<DerivedRow>) {
    let mut window = RollingWindow::new(config.window);
    let mut previous: Option<f64> = None;

    for row in history {
        let current = row.gdppc;
        let growth = match (previous, current) {
            (Some(previous), Some(current)) => growth_rate(previous, current),
            _ => None,
        };

        let rolling = match growth {
            Some(growth) => {
                window.push(growth);
                window.mean()
            }
            None => {
                window.clear();
                None
            }
        };

        output.push(DerivedRow {
            row: (*row).clone(),
            gdppc_growth: growth,
            gdppc_growth_rolling: rolling,
        });
        previous = current;
    }
}
