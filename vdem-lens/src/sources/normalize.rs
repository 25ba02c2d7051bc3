//! Turning raw records into [`PanelRow`]s.
//!
//! Per record the entity name is cleaned and passed through the alias
//! table, the year is parsed as an integer and every other mapped column is
//! read as an optional number. A record without an entity or a usable year
//! is dropped; a bad optional cell only makes that field absent.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::{ColumnMapping, DropReason, LoadOutcome, LoadReport};
use crate::core::row::{PanelRow, Regime};
use crate::logging::{truncate_field, LogConfig};
use crate::{log_data_op, log_row_drop};

/// A single cell as the source presents it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// The record has no such column.
    Missing,
    Null,
    Text(&'a str),
    Number(f64),
    /// Anything else (booleans, nested values).
    Other,
}

/// Column access over one source record.
pub trait RawRecord {
    fn get(&self, column: &str) -> RawValue<'_>;
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\s+").expect("whitespace pattern is valid")
});

// Keys are stored whitespace-normalized.
static ENTITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Turkey", "Türkiye"),
        ("Burma/Myanmar", "Myanmar"),
        ("Burma", "Myanmar"),
        ("Swaziland", "Eswatini"),
        ("Macedonia", "North Macedonia"),
        ("United States", "United States of America"),
        ("USA", "United States of America"),
        ("Czech Republic", "Czechia"),
    ])
});

/// Cleans an entity name and resolves aliases so that one country is never
/// split across two keys.
///
/// Returns `None` for a blank name. The flag is `true` when the alias table
/// rewrote the name.
pub fn normalize_entity(raw: &str) -> Option<(String, bool)> {
    let cleaned = WHITESPACE.replace_all(raw.trim(), " ");
    if cleaned.is_empty() {
        return None;
    }
    match ENTITY_ALIASES.get(cleaned.as_ref()) {
        Some(canonical) => Some(((*canonical).to_string(), true)),
        None => Some((cleaned.into_owned(), false)),
    }
}

/// Reads a year from a cell: an integer, or a number with no fractional part.
fn parse_year(value: RawValue<'_>) -> Option<i32> {
    let number = match value {
        RawValue::Number(n) => n,
        RawValue::Text(text) => {
            let text = text.trim();
            if let Ok(year) = text.parse::<i32>() {
                return Some(year);
            }
            text.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if number.is_finite()
        && number.fract() == 0.0
        && number >= f64::from(i32::MIN)
        && number <= f64::from(i32::MAX)
    {
        Some(number as i32)
    } else {
        None
    }
}

/// Outcome of reading an optional numeric cell.
enum Cell {
    Absent,
    Value(f64),
    /// Present but not a usable number.
    Coerced,
}

fn parse_number(value: RawValue<'_>) -> Cell {
    match value {
        RawValue::Missing | RawValue::Null => Cell::Absent,
        RawValue::Number(n) if n.is_finite() => Cell::Value(n),
        RawValue::Number(_) | RawValue::Other => Cell::Coerced,
        RawValue::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Cell::Absent;
            }
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Cell::Value(n),
                _ => Cell::Coerced,
            }
        }
    }
}

fn parse_label(value: RawValue<'_>) -> Option<String> {
    match value {
        RawValue::Text(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        RawValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{}", n as i64)),
        RawValue::Number(n) if n.is_finite() => Some(n.to_string()),
        _ => None,
    }
}

/// Streaming normalizer that keeps the load report as it goes.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use vdem_lens::sources::{ColumnMapping, Normalizer, RawRecord, RawValue};
///
/// struct Cells(HashMap<&'static str, &'static str>);
///
/// impl RawRecord for Cells {
///     fn get(&self, column: &str) -> RawValue<'_> {
///         self.0.get(column).map_or(RawValue::Missing, |v| RawValue::Text(v))
///     }
/// }
///
/// let mapping = ColumnMapping::lite();
/// let mut normalizer = Normalizer::new(&mapping, "inline");
/// normalizer.push(&Cells(HashMap::from([("country", "Turkey"), ("year", "2001")])));
/// normalizer.push(&Cells(HashMap::from([("country", "Chile"), ("year", "n/a")])));
///
/// let outcome = normalizer.finish();
/// assert_eq!(outcome.rows[0].country, "Türkiye");
/// assert_eq!(outcome.report.rows_kept, 1);
/// ```
#[derive(Debug)]
pub struct Normalizer<'m> {
    mapping: &'m ColumnMapping,
    source_name: String,
    log_config: LogConfig,
    seen: HashSet<(String, i32)>,
    rows: Vec<PanelRow>,
    report: LoadReport,
}

impl<'m> Normalizer<'m> {
    pub fn new(mapping: &'m ColumnMapping, source_name: impl Into<String>) -> Self {
        Self {
            mapping,
            source_name: source_name.into(),
            log_config: LogConfig::default(),
            seen: HashSet::new(),
            rows: Vec::new(),
            report: LoadReport::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Notes mapped optional columns that the source does not carry.
    pub fn set_missing_columns(&mut self, columns: Vec<String>) {
        self.report.missing_columns = columns;
    }

    /// Counts a record that could not even be read as a record.
    pub fn push_malformed(&mut self) {
        self.report.rows_read += 1;
        self.drop_record(DropReason::Malformed, "");
    }

    /// Normalizes one record, keeping it if its entity and year are usable
    /// and the entity-year has not been seen before.
    pub fn push(&mut self, record: &impl RawRecord) {
        self.report.rows_read += 1;
        let mapping = self.mapping;

        let entity = match record.get(&mapping.entity) {
            RawValue::Text(text) => normalize_entity(text),
            _ => None,
        };
        let Some((country, renamed)) = entity else {
            self.drop_record(DropReason::MissingEntity, "");
            return;
        };

        let Some(year) = parse_year(record.get(&mapping.year)) else {
            self.drop_record(DropReason::UnparseableYear, &country);
            return;
        };

        if !self.seen.insert((country.clone(), year)) {
            self.drop_record(DropReason::DuplicateEntityYear, &country);
            return;
        }
        if renamed {
            self.report.entities_renamed += 1;
        }

        let mut row = PanelRow::new(country, year);
        row.polyarchy = self.number(record, mapping.polyarchy.as_deref());
        row.gdp = self.number(record, mapping.gdp.as_deref());
        row.gdppc = self.number(record, mapping.gdppc.as_deref());
        row.population = self
            .number(record, mapping.population.as_deref())
            .and_then(|population| {
                let persons = population * mapping.population_scale;
                if persons.is_finite() && persons >= 0.0 {
                    Some(persons)
                } else {
                    self.report.fields_coerced += 1;
                    None
                }
            });
        row.gdp_growth = self.number(record, mapping.gdp_growth.as_deref());
        row.inflation = self.number(record, mapping.inflation.as_deref());
        row.regime = self
            .number(record, mapping.regime.as_deref())
            .and_then(|code| {
                let regime = Regime::from_code(code);
                if regime.is_none() {
                    self.report.fields_coerced += 1;
                }
                regime
            });
        row.region = mapping
            .region
            .as_deref()
            .and_then(|column| parse_label(record.get(column)));

        self.rows.push(row);
    }

    fn number(&mut self, record: &impl RawRecord, column: Option<&str>) -> Option<f64> {
        match parse_number(record.get(column?)) {
            Cell::Absent => None,
            Cell::Value(value) => Some(value),
            Cell::Coerced => {
                self.report.fields_coerced += 1;
                None
            }
        }
    }

    fn drop_record(&mut self, reason: DropReason, entity: &str) {
        self.report.record_drop(reason);
        log_row_drop!(
            self.log_config,
            source = %self.source_name,
            record = self.report.rows_read,
            entity = %truncate_field(entity, self.log_config.max_field_length),
            reason = ?reason,
            "Dropped record"
        );
    }

    pub fn finish(mut self) -> LoadOutcome {
        self.report.rows_kept = self.rows.len();
        log_data_op!(
            self.log_config,
            source = %self.source_name,
            rows.read = self.report.rows_read,
            rows.kept = self.report.rows_kept,
            rows.dropped = self.report.rows_dropped(),
            entities.renamed = self.report.entities_renamed,
            fields.coerced = self.report.fields_coerced,
            "Normalized records"
        );
        LoadOutcome {
            rows: self.rows,
            report: self.report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cells(Vec<(&'static str, RawValue<'static>)>);

    impl RawRecord for Cells {
        fn get(&self, column: &str) -> RawValue<'_> {
            self.0
                .iter()
                .find(|(name, _)| *name == column)
                .map_or(RawValue::Missing, |(_, value)| *value)
        }
    }

    fn text(pairs: &[(&'static str, &'static str)]) -> Cells {
        Cells(
            pairs
                .iter()
                .map(|&(name, value)| (name, RawValue::Text(value)))
                .collect(),
        )
    }

    #[test]
    fn test_normalize_entity() {
        assert_eq!(
            normalize_entity("  Turkey "),
            Some(("Türkiye".to_string(), true))
        );
        assert_eq!(
            normalize_entity("Burma/Myanmar"),
            Some(("Myanmar".to_string(), true))
        );
        assert_eq!(
            normalize_entity("South\t Africa"),
            Some(("South Africa".to_string(), false))
        );
        assert_eq!(normalize_entity("   "), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(RawValue::Text(" 1999 ")), Some(1999));
        assert_eq!(parse_year(RawValue::Text("2001.0")), Some(2001));
        assert_eq!(parse_year(RawValue::Number(2005.0)), Some(2005));
        assert_eq!(parse_year(RawValue::Text("2001.5")), None);
        assert_eq!(parse_year(RawValue::Text("")), None);
        assert_eq!(parse_year(RawValue::Null), None);
    }

    #[test]
    fn test_numbers_become_absent_not_zero() {
        let mapping = ColumnMapping::lite();
        let mut normalizer = Normalizer::new(&mapping, "test");
        normalizer.push(&text(&[
            ("country", "Chile"),
            ("year", "1990"),
            ("polyarchy", "0.61"),
            ("gdppc", ""),
            ("gdpGrowth", "n/a"),
            ("inflation", "inf"),
        ]));
        let outcome = normalizer.finish();

        let row = &outcome.rows[0];
        assert_eq!(row.polyarchy, Some(0.61));
        assert_eq!(row.gdppc, None);
        assert_eq!(row.gdp_growth, None);
        assert_eq!(row.inflation, None);
        assert_eq!(outcome.report.fields_coerced, 2);
    }

    #[test]
    fn test_population_scaled_and_regime_checked() {
        let mapping = ColumnMapping::vdem();
        let mut normalizer = Normalizer::new(&mapping, "test");
        normalizer.push(&Cells(vec![
            ("country_name", RawValue::Text("India")),
            ("year", RawValue::Number(2014.0)),
            ("e_pop", RawValue::Number(1_300.5)),
            ("v2x_regime", RawValue::Number(2.0)),
            ("e_regionpol_6C", RawValue::Number(6.0)),
        ]));
        normalizer.push(&Cells(vec![
            ("country_name", RawValue::Text("Chile")),
            ("year", RawValue::Number(2014.0)),
            ("v2x_regime", RawValue::Number(7.0)),
            ("e_gdp", RawValue::Other),
        ]));
        let outcome = normalizer.finish();

        assert_eq!(outcome.rows[0].population, Some(1_300_500_000.0));
        assert_eq!(outcome.rows[0].regime, Some(Regime::ElectoralDemocracy));
        assert_eq!(outcome.rows[0].region.as_deref(), Some("6"));
        assert_eq!(outcome.rows[1].regime, None);
        assert_eq!(outcome.rows[1].gdp, None);
        assert_eq!(outcome.report.fields_coerced, 2);
    }

    #[test]
    fn test_negative_population_is_coerced_to_absent() {
        let mapping = ColumnMapping::lite();
        let mut normalizer = Normalizer::new(&mapping, "test");
        normalizer.push(&Cells(vec![
            ("country", RawValue::Text("B")),
            ("year", RawValue::Number(2000.0)),
            ("population", RawValue::Number(-3.0)),
        ]));
        normalizer.push(&Cells(vec![
            ("country", RawValue::Text("Z")),
            ("year", RawValue::Number(2000.0)),
            ("population", RawValue::Number(0.0)),
        ]));
        let outcome = normalizer.finish();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].population, None);
        assert_eq!(outcome.rows[1].population, Some(0.0));
        assert_eq!(outcome.report.fields_coerced, 1);
    }

    #[test]
    fn test_drops_are_counted_by_reason() {
        let mapping = ColumnMapping::lite();
        let mut normalizer = Normalizer::new(&mapping, "test").with_log_config(LogConfig::verbose());
        normalizer.push(&text(&[("country", "Turkey"), ("year", "2000")]));
        normalizer.push(&text(&[("country", "Türkiye"), ("year", "2000")]));
        normalizer.push(&text(&[("country", ""), ("year", "2000")]));
        normalizer.push(&text(&[("country", "Chile"), ("year", "year")]));
        normalizer.push(&text(&[("year", "2000")]));
        normalizer.push_malformed();
        let outcome = normalizer.finish();

        let report = &outcome.report;
        assert_eq!(report.rows_read, 6);
        assert_eq!(report.rows_kept, 1);
        assert_eq!(report.entities_renamed, 1);
        assert_eq!(report.dropped_for(DropReason::DuplicateEntityYear), 1);
        assert_eq!(report.dropped_for(DropReason::MissingEntity), 2);
        assert_eq!(report.dropped_for(DropReason::UnparseableYear), 1);
        assert_eq!(report.dropped_for(DropReason::Malformed), 1);
        assert_eq!(outcome.rows[0].country, "Türkiye");
    }
}
