//! End-to-end tests: load, derive, and build every chart from one store.

use std::io::Write;

use tempfile::NamedTempFile;
use vdem_lens::charts::{
    BinningConfig, DiminishingReturns, IncomeFacets, PriceOfLiberty, RegimeDistribution,
    TurbulenceOfTransition,
};
use vdem_lens::prelude::*;
use vdem_lens::sources::{ColumnMapping, CsvSource};
use vdem_lens::test_fixtures::{gap_series, panel_csv, synthetic_panel, PanelShape};

fn approx(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_gap_breaks_growth_series() {
    let store = PanelStore::from_rows(gap_series());
    let derived = store.derive(&GrowthConfig::default()).unwrap();

    let growth: Vec<Option<f64>> = derived.iter().map(|r| r.gdppc_growth).collect();
    assert_eq!(growth[0], None);
    approx(growth[1], 10.0);
    assert_eq!(growth[2], None);
    // 2003 has no immediately preceding value
    assert_eq!(growth[3], None);
    assert_eq!(derived[3].gdppc_growth_rolling, None);
}

#[test]
fn test_every_chart_from_one_derivation() {
    let store = PanelStore::from_rows(synthetic_panel(&PanelShape::default()));
    let rows = store.derive(&GrowthConfig::default()).unwrap();
    assert_eq!(rows.len(), store.len());

    let scatter = PriceOfLiberty::compare(&rows).unwrap();
    assert!(!scatter.honest.points.is_empty());
    assert!(scatter.honest.points.iter().all(|p| (2000..=2019).contains(&p.year)));
    assert!(scatter.distorted.points.iter().any(|p| p.year > 2019));

    let facets = IncomeFacets::compare(&rows).unwrap();
    assert_eq!(facets.honest.facets.len(), 4);
    assert_eq!(facets.distorted.facets.len(), 1);
    let faceted: usize = facets.honest.facets.iter().map(|f| f.points.len()).sum();
    assert_eq!(
        faceted + facets.honest.unclassified,
        facets.distorted.facets[0].points.len()
    );

    let dual = TurbulenceOfTransition::compare(&rows).unwrap();
    // No preferred entity exists in the synthetic panel
    assert!(dual.honest.entity.is_some());
    assert_eq!(dual.distorted.entity.as_deref(), Some("India"));
    assert!(dual.distorted.left.is_empty());

    let binning = DiminishingReturns::compare(&rows).unwrap();
    assert_eq!(binning.honest.bins.len(), 10);
    let honest_total: u64 = binning.honest.bins.iter().map(|b| b.count).sum();
    let distorted_total: u64 = binning.distorted.bins.iter().map(|b| b.count).sum();
    assert!(distorted_total > honest_total);
    for bin in &binning.honest.bins {
        assert_eq!(bin.count == 0, bin.value.is_no_data());
    }

    let regimes = RegimeDistribution::compare(&rows).unwrap();
    assert_eq!(regimes.honest.groups.len(), 4);
    assert!(regimes.honest.groups.iter().any(|g| g.summary.is_some()));
}

#[test]
fn test_derivation_does_not_touch_the_store() {
    let store = PanelStore::from_rows(synthetic_panel(&PanelShape::small()));
    let before = store.rows().to_vec();
    let first = store.derive(&GrowthConfig::default()).unwrap();
    let second = store.derive(&GrowthConfig::default().with_window(3)).unwrap();
    assert_eq!(store.rows(), before.as_slice());
    assert_eq!(first.len(), second.len());
}

#[test]
fn test_summaries_serialize_for_presentation() {
    let rows = PanelStore::from_rows(synthetic_panel(&PanelShape::small()))
        .derive(&GrowthConfig::default())
        .unwrap();
    let comparison = DiminishingReturns::compare(&rows).unwrap();
    let json = serde_json::to_value(&comparison).unwrap();
    assert_eq!(json["honest"]["variant"], "honest");
    assert_eq!(json["distorted"]["averaging"], "arithmetic");
    assert_eq!(json["honest"]["bins"].as_array().unwrap().len(), 10);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = BinningConfig::distorted();
    let json = serde_json::to_string(&config).unwrap();
    let back: BinningConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    assert_eq!(BinningConfig::preset(ChartVariant::Distorted), config);
}

#[tokio::test]
async fn test_csv_to_charts() {
    let rows = synthetic_panel(&PanelShape::small());
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    file.write_all(panel_csv(&rows, &ColumnMapping::vdem()).as_bytes())
        .unwrap();
    file.flush().unwrap();

    let source = CsvSource::new(file.path().to_str().unwrap(), ColumnMapping::vdem());
    let store = PanelStore::load(&source).await.unwrap();
    assert_eq!(store.len(), rows.len());
    assert_eq!(store.report().rows_dropped(), 0);

    let derived = store.derive(&GrowthConfig::default()).unwrap();
    let scatter = PriceOfLiberty::compare(&derived).unwrap();
    assert_eq!(scatter.honest.variant, ChartVariant::Honest);

    // Population went through the millions column and back
    let original = rows.iter().find_map(|r| r.population).unwrap();
    let loaded = store.rows().iter().find_map(|r| r.population).unwrap();
    assert!((original - loaded).abs() / original < 1e-9);
}
