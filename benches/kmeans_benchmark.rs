use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kmeans_stepper::{rng_from_seed, DatasetConfig, InitMethod, KMeansConfig, KMeansEngine};
use std::time::Duration;

fn engine_for(n_samples: usize) -> KMeansEngine {
    let config = KMeansConfig::default().with_dataset(DatasetConfig::blobs(n_samples, 8, 1.0));
    KMeansEngine::with_config(config).unwrap()
}

fn benchmark_initializers(c: &mut Criterion) {
    let mut group = c.benchmark_group("initialize");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let engine = engine_for(2_000);
    let data = engine.generate(&mut rng_from_seed(42)).unwrap();
    let k = 16;

    for (name, method) in [
        ("random", InitMethod::Random),
        ("farthest_first", InitMethod::FarthestFirst),
        ("kmeans_plus_plus", InitMethod::KMeansPlusPlus),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &method, |b, method| {
            b.iter(|| {
                let mut rng = rng_from_seed(7);
                engine
                    .initialize(method, black_box(&data.view()), k, &mut rng)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn benchmark_step_varying_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_samples");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let sample_sizes = [100, 1_000, 5_000];

    for n_samples in sample_sizes.iter() {
        group.throughput(Throughput::Elements(*n_samples as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_samples),
            n_samples,
            |b, &n_samples| {
                let engine = engine_for(n_samples);
                let mut rng = rng_from_seed(42);
                let data = engine.generate(&mut rng).unwrap();
                let init = engine
                    .initialize(&InitMethod::Random, &data.view(), 8, &mut rng)
                    .unwrap();

                b.iter(|| {
                    engine
                        .step(
                            black_box(&data.view()),
                            &init.centroids.view(),
                            &init.labels.view(),
                        )
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn benchmark_run_to_convergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_to_convergence");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_secs(2));

    let cluster_counts = [2, 8, 32];
    let engine = engine_for(2_000);
    let data = engine.generate(&mut rng_from_seed(42)).unwrap();

    for k in cluster_counts.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            let init = engine
                .initialize(&InitMethod::KMeansPlusPlus, &data.view(), k, &mut rng_from_seed(1))
                .unwrap();

            b.iter(|| {
                engine
                    .run_to_convergence(
                        black_box(&data.view()),
                        &init.centroids.view(),
                        &init.labels.view(),
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_initializers,
    benchmark_step_varying_samples,
    benchmark_run_to_convergence
);
criterion_main!(benches);
