use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use safecity_datasets::generate;
use safecity_risk::{train_with, RandomForestParams, RiskPredictor};

fn random_forest_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let district_sizes = vec![100, 1000];
    let tree_counts = vec![10, 100];

    let mut benchmark = c.benchmark_group("random_forest");
    for per_district in district_sizes {
        let incidents = generate::city(per_district, &mut rng).unwrap();
        for &n_trees in &tree_counts {
            let id = format!("{}-incidents-{}-trees", incidents.len(), n_trees);
            benchmark.bench_function(BenchmarkId::new("train", &id), |bencher| {
                bencher.iter(|| {
                    train_with(
                        black_box(&incidents),
                        RandomForestParams::new(black_box(n_trees)),
                    )
                    .unwrap()
                });
            });
        }

        let artifact = train_with(&incidents, RandomForestParams::default()).unwrap();
        let predictor: RiskPredictor = RiskPredictor::new(artifact, Arc::new(incidents));
        benchmark.bench_function(
            BenchmarkId::new("predict_risk", predictor.history().len()),
            |bencher| {
                bencher.iter(|| {
                    predictor
                        .predict_risk(black_box(40.715), black_box(-74.002), black_box(12))
                        .unwrap()
                });
            },
        );
    }

    benchmark.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = random_forest_bench
}
criterion_main!(benches);
