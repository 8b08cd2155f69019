use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sonargate::core::classification::rules::{self, RuleContext, CATALOG};
use sonargate::core::types::{Classification, Risks, Signals, Subgenre};

fn sample_classification() -> Classification {
    Classification {
        primary: Subgenre::from("TRAP"),
        confidence: 0.72,
        is_uncertain: false,
        conflicting_signals: false,
        top_candidates: vec![(Subgenre::from("TRAP"), 0.72), (Subgenre::from("HOUSE"), 0.2)],
        likelihoods: HashMap::new(),
    }
}

fn bench_rule_evaluation(c: &mut Criterion) {
    let signals = Signals {
        sub_bass_energy: Some(0.8),
        transient_density: Some(0.6),
        dynamic_range: Some(0.3),
        stereo_width: Some(0.5),
        distortion: Some(0.1),
        ..Default::default()
    };
    let risks = Risks {
        masking_risk: Some(0.7),
        clipping_risk: Some(0.4),
        over_compression_risk: Some(0.5),
        ..Default::default()
    };
    let classification = sample_classification();

    c.bench_function("classification: rules::evaluate over the full catalog", |b| {
        b.iter(|| {
            let ctx = RuleContext {
                signals: black_box(&signals),
                risks: black_box(&risks),
                classification: black_box(&classification),
            };
            rules::evaluate(&ctx, CATALOG)
        });
    });
}

criterion_group!(benches, bench_rule_evaluation);
criterion_main!(benches);
