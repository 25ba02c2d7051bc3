//! Synthetic panels for tests and benchmarks.
//!
//! The generator is seeded, so a given [`PanelShape`] always produces the
//! same rows. Countries drift slowly in democracy and income, a share of
//! observations is left missing, and regime codes follow the democracy
//! index the way they roughly do in the real data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::row::{PanelRow, Regime};
use crate::sources::ColumnMapping;

const REGIONS: [&str; 6] = [
    "Eastern Europe and Central Asia",
    "Latin America and the Caribbean",
    "Middle East and North Africa",
    "Sub-Saharan Africa",
    "Western Europe and North America",
    "Asia and Pacific",
];

/// Size and sparsity of a generated panel.
#[derive(Debug, Clone)]
pub struct PanelShape {
    pub countries: usize,
    pub first_year: i32,
    pub last_year: i32,
    /// Chance that any single optional observation is missing.
    pub missing_rate: f64,
    pub seed: u64,
}

impl Default for PanelShape {
    fn default() -> Self {
        Self {
            countries: 40,
            first_year: 1990,
            last_year: 2022,
            missing_rate: 0.05,
            seed: 42,
        }
    }
}

impl PanelShape {
    pub fn small() -> Self {
        Self {
            countries: 8,
            first_year: 2000,
            last_year: 2019,
            ..Self::default()
        }
    }

    pub fn large() -> Self {
        Self {
            countries: 180,
            first_year: 1900,
            last_year: 2022,
            ..Self::default()
        }
    }
}

/// Generates a panel ordered by country then year.
pub fn synthetic_panel(shape: &PanelShape) -> Vec<PanelRow> {
    let mut rng = StdRng::seed_from_u64(shape.seed);
    let mut rows = Vec::new();

    for index in 0..shape.countries {
        let country = format!("Country {index:03}");
        let region = REGIONS[index % REGIONS.len()];
        let mut polyarchy: f64 = rng.random_range(0.05..0.95);
        let mut gdppc: f64 = rng.random_range(500.0..60_000.0);
        let mut population: f64 = rng.random_range(2.0e5..2.0e8);

        for year in shape.first_year..=shape.last_year {
            polyarchy = (polyarchy + rng.random_range(-0.03..0.03)).clamp(0.0, 1.0);
            let growth: f64 = rng.random_range(-4.0..8.0);
            gdppc *= 1.0 + growth / 100.0;
            population *= 1.0 + rng.random_range(0.0..0.025);

            let mut row = PanelRow::new(country.clone(), year).with_region(region);
            let observe = |rng: &mut StdRng| !rng.random_bool(shape.missing_rate);
            if observe(&mut rng) {
                row.polyarchy = Some(polyarchy);
                row.regime = Some(regime_for(polyarchy));
            }
            if observe(&mut rng) {
                row.gdppc = Some(gdppc);
                row.gdp = Some(gdppc * population);
            }
            if observe(&mut rng) {
                row.population = Some(population);
            }
            if observe(&mut rng) {
                row.gdp_growth = Some(growth + rng.random_range(0.0..2.0));
            }
            if observe(&mut rng) {
                row.inflation = Some(rng.random_range(0.0..15.0));
            }
            rows.push(row);
        }
    }
    rows
}

fn regime_for(polyarchy: f64) -> Regime {
    match polyarchy {
        p if p < 0.25 => Regime::ClosedAutocracy,
        p if p < 0.5 => Regime::ElectoralAutocracy,
        p if p < 0.75 => Regime::ElectoralDemocracy,
        _ => Regime::LiberalDemocracy,
    }
}

/// Renders rows as CSV under the column names of `mapping`, with absent
/// values as empty cells.
pub fn panel_csv(rows: &[PanelRow], mapping: &ColumnMapping) -> String {
    let header = mapping.columns().join(",");
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(&header);
    out.push('\n');

    let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for row in rows {
        let mut cells = vec![csv_text(&row.country), row.year.to_string()];
        for column in mapping.optional_columns() {
            let cell = if Some(column) == mapping.polyarchy.as_deref() {
                number(row.polyarchy)
            } else if Some(column) == mapping.gdp.as_deref() {
                number(row.gdp)
            } else if Some(column) == mapping.gdppc.as_deref() {
                number(row.gdppc)
            } else if Some(column) == mapping.population.as_deref() {
                number(row.population.map(|p| p / mapping.population_scale))
            } else if Some(column) == mapping.gdp_growth.as_deref() {
                number(row.gdp_growth)
            } else if Some(column) == mapping.inflation.as_deref() {
                number(row.inflation)
            } else if Some(column) == mapping.regime.as_deref() {
                row.regime.map(|r| r.code().to_string()).unwrap_or_default()
            } else {
                row.region.as_deref().map(csv_text).unwrap_or_default()
            };
            cells.push(cell);
        }
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn csv_text(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One entity with per-capita GDP `[100, 110, absent, 121]` over 2000-2003.
pub fn gap_series() -> Vec<PanelRow> {
    vec![
        PanelRow::new("A", 2000).with_gdppc(100.0),
        PanelRow::new("A", 2001).with_gdppc(110.0),
        PanelRow::new("A", 2002),
        PanelRow::new("A", 2003).with_gdppc(121.0),
    ]
}
