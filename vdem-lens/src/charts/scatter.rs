//! "The Price of Liberty": democracy against growth, one dot per
//! country-year, with a pooled trend line.
//!
//! The distorted variant stretches both axes to the full extent of the data,
//! so a handful of boom and bust years set the scale, and draws the pooled
//! regression across that whole range as if it held everywhere.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{count_clipped, AxisDomain, AxisPolicy, Chart, ChartConfig, ChartVariant};
use crate::analyzers::{RegressionFit, RegressionState};
use crate::core::filter::RowFilter;
use crate::core::row::{DerivedRow, Field};
use crate::error::{LensError, Result};

/// Cohort threshold: countries with more than ten million people.
pub const MIN_POPULATION: f64 = 10_000_000.0;

/// Countries called out by name on the honest chart.
pub const FEATURED_COUNTRIES: [&str; 6] = [
    "China",
    "Vietnam",
    "Ethiopia",
    "United States of America",
    "Germany",
    "France",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterConfig {
    pub variant: ChartVariant,
    pub filter: RowFilter,
    pub x_field: Field,
    pub y_field: Field,
    pub x_axis: AxisPolicy,
    pub y_axis: AxisPolicy,
    /// Draw the y axis upside down.
    pub invert_y: bool,
    /// X range the trend line is drawn over; the x domain when unset.
    pub fit_span: Option<(f64, f64)>,
    /// Entities to label, each at its latest plotted year.
    pub featured: Vec<String>,
}

impl ChartConfig for ScatterConfig {
    fn honest() -> Self {
        Self {
            variant: ChartVariant::Honest,
            filter: RowFilter::new()
                .years(2000, 2019)
                .min_population(MIN_POPULATION)
                .require(Field::Polyarchy)
                .require(Field::GdpGrowth),
            x_field: Field::Polyarchy,
            y_field: Field::GdpGrowth,
            x_axis: AxisPolicy::fixed(0.0, 1.0),
            y_axis: AxisPolicy::Trimmed {
                lower_p: 0.05,
                upper_p: 0.95,
                padding: 1.0,
            },
            invert_y: false,
            fit_span: Some((0.02, 0.98)),
            featured: FEATURED_COUNTRIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn distorted() -> Self {
        Self {
            variant: ChartVariant::Distorted,
            filter: RowFilter::new()
                .years(2000, 2022)
                .min_population(MIN_POPULATION)
                .exclude("Equatorial Guinea")
                .require(Field::Polyarchy)
                .require(Field::GdpGrowth),
            x_field: Field::Polyarchy,
            y_field: Field::GdpGrowth,
            x_axis: AxisPolicy::Extent { padding: 0.0 },
            y_axis: AxisPolicy::Extent { padding: 0.0 },
            invert_y: false,
            fit_span: None,
            featured: Vec::new(),
        }
    }

    fn variant(&self) -> ChartVariant {
        self.variant
    }

    fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.x_axis.validate()?;
        self.y_axis.validate()?;
        if let Some((x0, x1)) = self.fit_span {
            if !x0.is_finite() || !x1.is_finite() || x0 >= x1 {
                return Err(LensError::configuration(format!(
                    "trend line span must be increasing, got ({x0}, {x1})"
                )));
            }
        }
        Ok(())
    }
}

impl ScatterConfig {
    pub fn with_years(mut self, start: i32, end: i32) -> Self {
        self.filter = self.filter.years(start, end);
        self
    }

    pub fn with_inverted_y(mut self, inverted: bool) -> Self {
        self.invert_y = inverted;
        self
    }

    pub fn with_featured(mut self, featured: Vec<String>) -> Self {
        self.featured = featured;
        self
    }
}

/// One plotted country-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub country: String,
    pub year: i32,
    pub x: f64,
    pub y: f64,
    pub population: Option<f64>,
    pub region: Option<String>,
}

impl ScatterPoint {
    /// `None` unless both fields are present on the row.
    pub(crate) fn from_row(row: &DerivedRow, x_field: Field, y_field: Field) -> Option<Self> {
        Some(Self {
            country: row.country().to_string(),
            year: row.year(),
            x: row.value(x_field)?,
            y: row.value(y_field)?,
            population: row.row.population,
            region: row.row.region.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedPoint {
    pub label: String,
    pub year: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterSummary {
    pub variant: ChartVariant,
    pub points: Vec<ScatterPoint>,
    pub x_domain: Option<AxisDomain>,
    pub y_domain: Option<AxisDomain>,
    pub fit: RegressionFit,
    /// Trend line end points, absent when there is nothing to fit.
    pub fit_line: Option<[(f64, f64); 2]>,
    pub featured: Vec<FeaturedPoint>,
    /// Points outside the y domain.
    pub clipped: usize,
}

/// Builds the democracy-versus-growth scatter.
#[instrument(skip(rows, config), fields(rows = rows.len(), variant = %config.variant))]
pub fn price_of_liberty(rows: &[DerivedRow], config: &ScatterConfig) -> Result<ScatterSummary> {
    config.validate()?;

    let points: Vec<ScatterPoint> = config
        .filter
        .apply(rows)
        .into_iter()
        .filter_map(|row| ScatterPoint::from_row(row, config.x_field, config.y_field))
        .collect();

    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    let x_domain = config.x_axis.resolve(&xs);
    let y_domain = config
        .y_axis
        .resolve(&ys)
        .map(|domain| if config.invert_y { domain.inverted() } else { domain });

    let fit = RegressionState::from_points(points.iter().map(|p| (p.x, p.y))).fit();
    let fit_line = if fit.n == 0 {
        None
    } else {
        config
            .fit_span
            .or_else(|| x_domain.map(|d| (d.lower, d.upper)))
            .map(|(x0, x1)| fit.line(x0, x1))
    };

    let featured = config
        .featured
        .iter()
        .filter_map(|name| {
            points
                .iter()
                .filter(|p| &p.country == name)
                .max_by_key(|p| p.year)
                .map(|p| FeaturedPoint {
                    label: name.clone(),
                    year: p.year,
                    x: p.x,
                    y: p.y,
                })
        })
        .collect();

    let clipped = count_clipped(ys.iter().copied(), y_domain.as_ref());
    debug!(
        points = points.len(),
        clipped,
        slope = fit.slope,
        r_squared = ?fit.r_squared,
        "Computed scatter"
    );

    Ok(ScatterSummary {
        variant: config.variant,
        points,
        x_domain,
        y_domain,
        fit,
        fit_line,
        featured,
        clipped,
    })
}

/// Marker type for the democracy-versus-growth scatter.
pub struct PriceOfLiberty;

impl Chart for PriceOfLiberty {
    type Config = ScatterConfig;
    type Summary = ScatterSummary;

    const NAME: &'static str = "price_of_liberty";

    fn summarize(rows: &[DerivedRow], config: &ScatterConfig) -> Result<ScatterSummary> {
        price_of_liberty(rows, config)
    }
}
