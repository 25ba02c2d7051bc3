//! Row selection criteria supplied by the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::row::{DerivedRow, Field};
use crate::error::{LensError, Result};

/// An inclusive range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(LensError::configuration(format!(
                "year range is inverted: {} > {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Criteria restricting which derived rows a view sees.
///
/// An empty filter matches every row. `min_population` is a strict lower
/// bound and a row without a population figure does not pass it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub years: Option<YearRange>,
    /// When set, only these entities pass.
    pub entities: Option<BTreeSet<String>>,
    pub exclude_entities: BTreeSet<String>,
    pub min_population: Option<f64>,
    /// Fields that must be observed (or derivable) for a row to pass.
    pub required: Vec<Field>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn years(mut self, start: i32, end: i32) -> Self {
        self.years = Some(YearRange::new(start, end));
        self
    }

    pub fn entity(mut self, name: impl Into<String>) -> Self {
        self.entities
            .get_or_insert_with(BTreeSet::new)
            .insert(name.into());
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude_entities.insert(name.into());
        self
    }

    pub fn min_population(mut self, population: f64) -> Self {
        self.min_population = Some(population);
        self
    }

    pub fn require(mut self, field: Field) -> Self {
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(years) = &self.years {
            years.validate()?;
        }
        if let Some(min) = self.min_population {
            if !min.is_finite() {
                return Err(LensError::configuration(
                    "minimum population must be finite",
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, row: &DerivedRow) -> bool {
        if let Some(years) = &self.years {
            if !years.contains(row.year()) {
                return false;
            }
        }
        if let Some(entities) = &self.entities {
            if !entities.contains(row.country()) {
                return false;
            }
        }
        if self.exclude_entities.contains(row.country()) {
            return false;
        }
        if let Some(min) = self.min_population {
            match row.row.population {
                Some(population) if population > min => {}
                _ => return false,
            }
        }
        self.required
            .iter()
            .all(|&field| row.value(field).is_some_and(f64::is_finite))
    }

    pub fn apply<'a>(&self, rows: &'a [DerivedRow]) -> Vec<&'a DerivedRow> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}
