//! Panel rows and the fields the pipeline reads from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// V-Dem "Regimes of the World" classification (`v2x_regime`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Regime {
    ClosedAutocracy,
    ElectoralAutocracy,
    ElectoralDemocracy,
    LiberalDemocracy,
}

impl Regime {
    /// All regimes in code order.
    pub const ALL: [Regime; 4] = [
        Regime::ClosedAutocracy,
        Regime::ElectoralAutocracy,
        Regime::ElectoralDemocracy,
        Regime::LiberalDemocracy,
    ];

    /// Maps a numeric code to a regime. Non-integral or out-of-range codes
    /// are not regimes.
    pub fn from_code(code: f64) -> Option<Self> {
        if !code.is_finite() || code.fract() != 0.0 {
            return None;
        }
        match code as i64 {
            0 => Some(Regime::ClosedAutocracy),
            1 => Some(Regime::ElectoralAutocracy),
            2 => Some(Regime::ElectoralDemocracy),
            3 => Some(Regime::LiberalDemocracy),
            _ => None,
        }
    }

    /// The `v2x_regime` code.
    pub fn code(self) -> u8 {
        match self {
            Regime::ClosedAutocracy => 0,
            Regime::ElectoralAutocracy => 1,
            Regime::ElectoralDemocracy => 2,
            Regime::LiberalDemocracy => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Regime::ClosedAutocracy => "Closed autocracy",
            Regime::ElectoralAutocracy => "Electoral autocracy",
            Regime::ElectoralDemocracy => "Electoral democracy",
            Regime::LiberalDemocracy => "Liberal democracy",
        }
    }
}

impl From<Regime> for u8 {
    fn from(regime: Regime) -> Self {
        regime.code()
    }
}

impl TryFrom<u8> for Regime {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Regime::from_code(f64::from(code)).ok_or_else(|| format!("unknown regime code {code}"))
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One country-year observation.
///
/// Every numeric observation is optional: `None` means "not observed" and is
/// never the same thing as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRow {
    /// Normalized entity (country) name.
    pub country: String,
    pub year: i32,
    /// Electoral democracy index, 0 to 1.
    pub polyarchy: Option<f64>,
    pub gdp: Option<f64>,
    /// GDP per capita.
    pub gdppc: Option<f64>,
    /// Population in persons.
    pub population: Option<f64>,
    /// Annual GDP growth in percent, as published.
    pub gdp_growth: Option<f64>,
    pub inflation: Option<f64>,
    pub regime: Option<Regime>,
    pub region: Option<String>,
}

impl PanelRow {
    /// Creates a row with no observations.
    pub fn new(country: impl Into<String>, year: i32) -> Self {
        Self {
            country: country.into(),
            year,
            polyarchy: None,
            gdp: None,
            gdppc: None,
            population: None,
            gdp_growth: None,
            inflation: None,
            regime: None,
            region: None,
        }
    }

    pub fn with_polyarchy(mut self, value: f64) -> Self {
        self.polyarchy = Some(value);
        self
    }

    pub fn with_gdp(mut self, value: f64) -> Self {
        self.gdp = Some(value);
        self
    }

    pub fn with_gdppc(mut self, value: f64) -> Self {
        self.gdppc = Some(value);
        self
    }

    pub fn with_population(mut self, value: f64) -> Self {
        self.population = Some(value);
        self
    }

    pub fn with_gdp_growth(mut self, value: f64) -> Self {
        self.gdp_growth = Some(value);
        self
    }

    pub fn with_inflation(mut self, value: f64) -> Self {
        self.inflation = Some(value);
        self
    }

    pub fn with_regime(mut self, regime: Regime) -> Self {
        self.regime = Some(regime);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Returns an observed field. Derived fields are never present on a raw row.
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Polyarchy => self.polyarchy,
            Field::Gdp => self.gdp,
            Field::GdpPerCapita => self.gdppc,
            Field::Population => self.population,
            Field::GdpGrowth => self.gdp_growth,
            Field::Inflation => self.inflation,
            Field::RegimeCode => self.regime.map(|r| f64::from(r.code())),
            Field::GdppcGrowth | Field::GdppcGrowthRolling | Field::TrendGrowth => None,
        }
    }
}

/// A panel row plus the growth fields derived within its entity's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRow {
    #[serde(flatten)]
    pub row: PanelRow,
    /// Period-over-period per-capita GDP growth, percent.
    pub gdppc_growth: Option<f64>,
    /// Trailing mean of `gdppc_growth`.
    pub gdppc_growth_rolling: Option<f64>,
}

impl DerivedRow {
    /// Wraps a row with no derived values.
    pub fn underived(row: PanelRow) -> Self {
        Self {
            row,
            gdppc_growth: None,
            gdppc_growth_rolling: None,
        }
    }

    pub fn country(&self) -> &str {
        &self.row.country
    }

    pub fn year(&self) -> i32 {
        self.row.year
    }

    /// Smoothed growth when available, otherwise the raw period growth.
    pub fn trend_growth(&self) -> Option<f64> {
        self.gdppc_growth_rolling.or(self.gdppc_growth)
    }

    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::GdppcGrowth => self.gdppc_growth,
            Field::GdppcGrowthRolling => self.gdppc_growth_rolling,
            Field::TrendGrowth => self.trend_growth(),
            other => self.row.value(other),
        }
    }
}

/// Names a numeric field of a [`DerivedRow`], so configs can pick axes,
/// weights and filters without closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Polyarchy,
    Gdp,
    GdpPerCapita,
    Population,
    GdpGrowth,
    Inflation,
    RegimeCode,
    GdppcGrowth,
    GdppcGrowthRolling,
    TrendGrowth,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Polyarchy => "polyarchy",
            Field::Gdp => "gdp",
            Field::GdpPerCapita => "gdppc",
            Field::Population => "population",
            Field::GdpGrowth => "gdp_growth",
            Field::Inflation => "inflation",
            Field::RegimeCode => "regime",
            Field::GdppcGrowth => "gdppc_growth",
            Field::GdppcGrowthRolling => "gdppc_growth_rolling",
            Field::TrendGrowth => "trend_growth",
        }
    }

    /// True for fields computed by the growth deriver.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Field::GdppcGrowth | Field::GdppcGrowthRolling | Field::TrendGrowth
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
