use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use safecity::traits::Fit;
use safecity::Dataset;
use safecity_datasets::generate;
use safecity_hotspots::{KMeans, KMeansInit, DEFAULT_N_CLUSTERS};

fn k_means_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(40);
    let district_sizes = vec![100, 1000, 10000];

    let mut benchmark = c.benchmark_group("naive_k_means");
    benchmark.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for per_district in district_sizes {
        let incidents = generate::city(per_district, &mut rng).unwrap();
        let dataset = Dataset::from(incidents.coordinates());
        benchmark.bench_function(BenchmarkId::new("naive_k_means", per_district), |bencher| {
            bencher.iter(|| {
                KMeans::params_with_rng(black_box(DEFAULT_N_CLUSTERS), black_box(rng.clone()))
                    .init_method(KMeansInit::KMeansPlusPlus)
                    .max_n_iterations(black_box(1000))
                    .tolerance(black_box(1e-8))
                    .fit(&dataset)
                    .unwrap()
            });
        });
    }

    benchmark.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = k_means_bench
}
criterion_main!(benches);
