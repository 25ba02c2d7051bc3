//! Benchmarks for growth derivation and chart computation over synthetic panels.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use vdem_lens::analyzers::{quantile, BoxSummary, FixedWidthBins};
use vdem_lens::charts::{
    Chart, DiminishingReturns, IncomeFacets, PriceOfLiberty, RegimeDistribution,
    TurbulenceOfTransition,
};
use vdem_lens::core::PanelStore;
use vdem_lens::derive::{derive_growth, GrowthConfig};
use vdem_lens::test_fixtures::{synthetic_panel, PanelShape};

fn bench_derive_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_growth");
    group.measurement_time(Duration::from_secs(8));

    for (name, shape) in [
        ("small", PanelShape::small()),
        ("default", PanelShape::default()),
        ("large", PanelShape::large()),
    ] {
        let rows = synthetic_panel(&shape);
        group.bench_with_input(BenchmarkId::new("window_5", name), &rows, |b, rows| {
            b.iter(|| derive_growth(black_box(rows), &GrowthConfig::default()).unwrap());
        });
    }

    group.finish();
}

fn bench_charts(c: &mut Criterion) {
    let store = PanelStore::from_rows(synthetic_panel(&PanelShape::large()));
    let rows = store.derive(&GrowthConfig::default()).unwrap();

    let mut group = c.benchmark_group("charts");
    group.measurement_time(Duration::from_secs(8));

    group.bench_function("price_of_liberty", |b| {
        b.iter(|| PriceOfLiberty::compare(black_box(&rows)).unwrap())
    });
    group.bench_function("income_facets", |b| {
        b.iter(|| IncomeFacets::compare(black_box(&rows)).unwrap())
    });
    group.bench_function("turbulence_of_transition", |b| {
        b.iter(|| TurbulenceOfTransition::compare(black_box(&rows)).unwrap())
    });
    group.bench_function("diminishing_returns", |b| {
        b.iter(|| DiminishingReturns::compare(black_box(&rows)).unwrap())
    });
    group.bench_function("regime_distribution", |b| {
        b.iter(|| RegimeDistribution::compare(black_box(&rows)).unwrap())
    });

    group.finish();
}

fn bench_analyzers(c: &mut Criterion) {
    let rows = synthetic_panel(&PanelShape::large());
    let values: Vec<f64> = rows.iter().filter_map(|r| r.gdp_growth).collect();
    let indices: Vec<f64> = rows.iter().filter_map(|r| r.polyarchy).collect();

    let mut group = c.benchmark_group("analyzers");
    group.bench_function("quantile", |b| {
        b.iter(|| quantile(black_box(&values), 0.95))
    });
    group.bench_function("box_summary", |b| {
        b.iter(|| BoxSummary::from_sample(black_box(&values)))
    });
    group.bench_function("decile_assignment", |b| {
        let bins = FixedWidthBins::deciles();
        b.iter(|| {
            black_box(&indices)
                .iter()
                .filter_map(|&v| bins.assign(v))
                .count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_derive_growth, bench_charts, bench_analyzers);
criterion_main!(benches);
