// Component scoring benchmark: sequential vs Rayon-parallel index fan-out.
//
// Run with: cargo bench

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sqi_scorer_rust::requirements::{InputLevel, Requirements};
use sqi_scorer_rust::scorer::SoilScorer;
use sqi_scorer_rust::soil::{Component, Horizon};

fn bench_component() -> Component {
    let rows: [(i32, i32, f64, f64, f64, f64, f64, f64, f64, f64); 4] = [
        // top, bot, sand, silt, clay, om, ph, cec, teb, db
        (0, 25, 20.0, 60.0, 20.0, 2.4, 6.3, 16.0, 12.0, 1.35),
        (25, 60, 22.0, 55.0, 23.0, 1.2, 6.6, 15.0, 11.0, 1.40),
        (60, 120, 25.0, 50.0, 25.0, 0.6, 7.2, 14.0, 12.0, 1.45),
        (120, 180, 30.0, 45.0, 25.0, 0.3, 7.8, 13.0, 12.0, 1.50),
    ];

    let horizons = rows
        .iter()
        .map(|r| {
            let mut h = Horizon::with_depths(r.0, r.1);
            h.sand = Some(r.2);
            h.silt = Some(r.3);
            h.clay = Some(r.4);
            h.om = Some(r.5);
            h.ph = Some(r.6);
            h.cec = Some(r.7);
            h.teb = Some(r.8);
            h.db = Some(r.9);
            h.ec = Some(0.5);
            h.esp = Some(1.5);
            h.caco3 = Some(2.0);
            h.gypsum = Some(0.2);
            h.cf = Some(5.0);
            h.rederive();
            h
        })
        .collect();

    let mut c = Component {
        cokey: "bench".to_string(),
        compname: "Bench".to_string(),
        comppct: 85.0,
        drain_num: 5,
        rd: 0.0,
        bedrock_depth: None,
        restriction_depth: None,
        slope: Some(1.5),
        temp_regime: Some("Mesic".to_string()),
        mineralogy: Some("Mixed".to_string()),
        horizons,
    };
    c.derive_rooting_depth();
    c
}

fn bench_scoring(c: &mut Criterion) {
    let requirements = Requirements::load(Path::new("data/raw_data")).expect("tables load");
    let scorer = SoilScorer::new(requirements);
    let component = bench_component();

    c.bench_function("score_component", |b| {
        b.iter(|| {
            scorer
                .score_component(black_box(&component), "4", InputLevel::Low)
                .unwrap()
        })
    });

    c.bench_function("score_component_parallel", |b| {
        b.iter(|| {
            scorer
                .score_component_parallel(black_box(&component), "4", InputLevel::Low)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_scoring);
criterion_main!(benches);
