//! Benchmarks for the stratified split and the logistic regression fit
//!
//! Run with: cargo bench --bench training_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use faer::Mat;
use rand::prelude::*;
use rand::SeedableRng;

use churnflow::model::{FeatureSet, LogisticRegression};
use churnflow::pipeline::stratified_split;

/// Synthetic encoded data: a few continuous columns plus 0/1 indicators,
/// labels drawn from a known linear model
fn generate_feature_set(n_rows: usize, n_features: usize, seed: u64) -> FeatureSet {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let weights: Vec<f64> = (0..n_features).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect();

    let mut x = Mat::<f64>::zeros(n_rows, n_features);
    let mut y = Vec::with_capacity(n_rows);

    for i in 0..n_rows {
        let mut z = -1.0;
        for (j, w) in weights.iter().enumerate() {
            let value = if j < 3 {
                rng.gen::<f64>() * 4.0 - 2.0
            } else {
                f64::from(u8::from(rng.gen_bool(0.3)))
            };
            x[(i, j)] = value;
            z += w * value;
        }
        let p = 1.0 / (1.0 + (-z).exp());
        y.push(i64::from(rng.gen_bool(p)));
    }

    FeatureSet {
        feature_names: (0..n_features).map(|j| format!("feature_{}", j)).collect(),
        x,
        y,
    }
}

fn bench_logistic_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("logistic_fit");

    for &n_rows in &[1_000usize, 5_000, 7_043] {
        let data = generate_feature_set(n_rows, 30, 42);
        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &data, |b, data| {
            let model = LogisticRegression::new();
            b.iter(|| model.fit(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_stratified_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("stratified_split");

    for &n_rows in &[7_043usize, 100_000] {
        let labels: Vec<i64> = (0..n_rows).map(|i| i64::from(i % 4 == 0)).collect();
        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &labels, |b, labels| {
            b.iter(|| stratified_split(black_box(labels), 0.15, 42).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_logistic_fit, bench_stratified_split);
criterion_main!(benches);
