//! Democracy against trend growth, faceted by income group.
//!
//! Splitting by income controls for catch-up growth: poor countries grow
//! fast and are more often autocratic, so the pooled trend can point the
//! other way from every within-group trend. The distorted preset is the
//! pooled view, a single facet with one regression.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use super::scatter::ScatterPoint;
use super::{count_clipped, AxisDomain, AxisPolicy, Chart, ChartConfig, ChartVariant};
use crate::analyzers::{finite_values, IncomeGroup, IncomeGroups, RegressionFit, RegressionState};
use crate::core::filter::RowFilter;
use crate::core::row::{DerivedRow, Field};
use crate::error::{LensError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetConfig {
    pub variant: ChartVariant,
    pub filter: RowFilter,
    pub x_field: Field,
    pub y_field: Field,
    pub x_axis: AxisPolicy,
    /// Shared by every facet.
    pub y_axis: AxisPolicy,
    /// X range each facet's trend line is drawn over.
    pub fit_span: (f64, f64),
    /// When false, all rows land in one pooled facet.
    pub facet_by_income: bool,
}

impl ChartConfig for FacetConfig {
    fn honest() -> Self {
        Self {
            variant: ChartVariant::Honest,
            filter: RowFilter::new()
                .years(2000, 2019)
                .require(Field::Polyarchy)
                .require(Field::TrendGrowth),
            x_field: Field::Polyarchy,
            y_field: Field::TrendGrowth,
            x_axis: AxisPolicy::fixed(0.0, 1.0),
            y_axis: AxisPolicy::Trimmed {
                lower_p: 0.05,
                upper_p: 0.95,
                padding: 1.0,
            },
            fit_span: (0.05, 0.95),
            facet_by_income: true,
        }
    }

    fn distorted() -> Self {
        Self {
            variant: ChartVariant::Distorted,
            facet_by_income: false,
            ..Self::honest()
        }
    }

    fn variant(&self) -> ChartVariant {
        self.variant
    }

    fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.x_axis.validate()?;
        self.y_axis.validate()?;
        let (x0, x1) = self.fit_span;
        if !x0.is_finite() || !x1.is_finite() || x0 >= x1 {
            return Err(LensError::configuration(format!(
                "trend line span must be increasing, got ({x0}, {x1})"
            )));
        }
        Ok(())
    }
}

/// One panel of the faceted scatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    /// `None` for the pooled facet.
    pub group: Option<IncomeGroup>,
    pub label: String,
    pub points: Vec<ScatterPoint>,
    pub fit: RegressionFit,
    pub fit_line: Option<[(f64, f64); 2]>,
}

impl Facet {
    fn build(group: Option<IncomeGroup>, points: Vec<ScatterPoint>, span: (f64, f64)) -> Self {
        let fit = RegressionState::from_points(points.iter().map(|p| (p.x, p.y))).fit();
        let fit_line = (fit.n > 0).then(|| fit.line(span.0, span.1));
        Self {
            group,
            label: group.map_or("All countries", IncomeGroup::label).to_string(),
            points,
            fit,
            fit_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSummary {
    pub variant: ChartVariant,
    /// Richest group first; every income group is present even when empty.
    pub facets: Vec<Facet>,
    pub x_domain: Option<AxisDomain>,
    pub y_domain: Option<AxisDomain>,
    /// Per-capita GDP quartile cuts the groups were assigned from.
    pub income_cuts: Vec<f64>,
    /// Rows left out for lack of a per-capita GDP figure.
    pub unclassified: usize,
    pub regions: BTreeSet<String>,
    pub clipped: usize,
}

/// Builds the income-faceted scatter.
#[instrument(skip(rows, config), fields(rows = rows.len(), variant = %config.variant))]
pub fn income_facets(rows: &[DerivedRow], config: &FacetConfig) -> Result<FacetSummary> {
    config.validate()?;

    let selected = config.filter.apply(rows);
    let gdppc = finite_values(selected.iter().map(|row| row.row.gdppc));
    let groups = IncomeGroups::from_sample(&gdppc)?;

    let mut unclassified = 0;
    let mut by_group: BTreeMap<IncomeGroup, Vec<ScatterPoint>> = BTreeMap::new();
    let mut pooled = Vec::new();
    for row in &selected {
        let Some(point) = ScatterPoint::from_row(row, config.x_field, config.y_field) else {
            continue;
        };
        if !config.facet_by_income {
            pooled.push(point);
            continue;
        }
        match groups.classify(row.row.gdppc) {
            Some(group) => by_group.entry(group).or_default().push(point),
            None => unclassified += 1,
        }
    }

    let facets: Vec<Facet> = if config.facet_by_income {
        IncomeGroup::DISPLAY_ORDER
            .iter()
            .map(|group| {
                let points = by_group.remove(group).unwrap_or_default();
                Facet::build(Some(*group), points, config.fit_span)
            })
            .collect()
    } else {
        vec![Facet::build(None, pooled, config.fit_span)]
    };

    let xs: Vec<f64> = facets.iter().flat_map(|f| f.points.iter().map(|p| p.x)).collect();
    let ys: Vec<f64> = facets.iter().flat_map(|f| f.points.iter().map(|p| p.y)).collect();
    let x_domain = config.x_axis.resolve(&xs);
    let y_domain = config.y_axis.resolve(&ys);
    let clipped = count_clipped(ys.iter().copied(), y_domain.as_ref());

    let regions = facets
        .iter()
        .flat_map(|f| f.points.iter().filter_map(|p| p.region.clone()))
        .collect();

    debug!(
        facets = facets.len(),
        points = ys.len(),
        unclassified,
        "Computed income facets"
    );

    Ok(FacetSummary {
        variant: config.variant,
        facets,
        x_domain,
        y_domain,
        income_cuts: groups.cuts().to_vec(),
        unclassified,
        regions,
        clipped,
    })
}

/// Marker type for the income-faceted scatter.
pub struct IncomeFacets;

impl Chart for IncomeFacets {
    type Config = FacetConfig;
    type Summary = FacetSummary;

    const NAME: &'static str = "income_facets";

    fn summarize(rows: &[DerivedRow], config: &FacetConfig) -> Result<FacetSummary> {
        income_facets(rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::row::PanelRow;

    fn row(country: &str, year: i32, polyarchy: f64, gdppc: f64, growth: f64) -> DerivedRow {
        let mut derived = DerivedRow::underived(
            PanelRow::new(country, year)
                .with_polyarchy(polyarchy)
                .with_gdppc(gdppc)
                .with_region("Somewhere"),
        );
        derived.gdppc_growth = Some(growth);
        derived
    }

    /// Within each income group growth rises with democracy, but rich
    /// democracies grow slowly, so the pooled trend is negative.
    fn simpson_panel() -> Vec<DerivedRow> {
        let groups = [
            ("Poor", 500.0, 0.1, 8.0),
            ("Lower", 2_000.0, 0.3, 6.0),
            ("Upper", 10_000.0, 0.5, 4.0),
            ("Rich", 40_000.0, 0.7, 2.0),
        ];
        let mut rows = Vec::new();
        for (name, gdppc, base_x, base_y) in groups {
            for i in 0..5 {
                let step = f64::from(i);
                rows.push(row(
                    &format!("{name}{i}"),
                    2010,
                    base_x + 0.04 * step,
                    gdppc + step,
                    base_y + 0.1 * step,
                ));
            }
        }
        rows
    }

    #[test]
    fn test_honest_facets_in_display_order() {
        let summary = income_facets(&simpson_panel(), &FacetConfig::honest()).unwrap();
        let labels: Vec<&str> = summary.facets.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["High Income", "Upper-Middle", "Lower-Middle", "Low Income"]
        );
        assert_eq!(summary.income_cuts.len(), 3);
        assert_eq!(summary.regions.len(), 1);

        for facet in &summary.facets {
            assert!(!facet.points.is_empty(), "{} is empty", facet.label);
            assert!(facet.fit.slope > 0.0, "{} slope {}", facet.label, facet.fit.slope);
            let [(x0, _), (x1, _)] = facet.fit_line.unwrap();
            assert_eq!((x0, x1), (0.05, 0.95));
        }
    }

    #[test]
    fn test_pooled_view_reverses_the_trend() {
        let summary = income_facets(&simpson_panel(), &FacetConfig::distorted()).unwrap();
        assert_eq!(summary.facets.len(), 1);
        assert_eq!(summary.facets[0].group, None);
        assert_eq!(summary.facets[0].points.len(), 20);
        assert!(summary.facets[0].fit.slope < 0.0);
    }

    #[test]
    fn test_rows_without_income_are_unclassified() {
        let mut rows = simpson_panel();
        let mut orphan = DerivedRow::underived(PanelRow::new("Nowhere", 2010).with_polyarchy(0.5));
        orphan.gdppc_growth = Some(1.0);
        rows.push(orphan);

        let summary = income_facets(&rows, &FacetConfig::honest()).unwrap();
        assert_eq!(summary.unclassified, 1);
        let plotted: usize = summary.facets.iter().map(|f| f.points.len()).sum();
        assert_eq!(plotted, 20);
    }

    #[test]
    fn test_trend_growth_prefers_rolling_mean() {
        let mut rows = simpson_panel();
        rows[0].gdppc_growth_rolling = Some(-3.0);
        let summary = income_facets(&rows, &FacetConfig::distorted()).unwrap();
        assert!(summary.facets[0].points.iter().any(|p| p.y == -3.0));
    }

    #[test]
    fn test_empty_input_yields_empty_facets() {
        let summary = income_facets(&[], &FacetConfig::honest()).unwrap();
        assert_eq!(summary.facets.len(), 4);
        assert!(summary.facets.iter().all(|f| f.points.is_empty() && f.fit_line.is_none()));
        assert_eq!(summary.y_domain, None);
    }
}
