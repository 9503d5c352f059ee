use canopy_rs::{
    compute_quantiles, train_tree, DecisionTreeParams, Labels, QuantizedInput, SplitCriterion,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array2, ShapeBuilder};
use std::hint::black_box;
use std::time::Duration;

/// Synthetic multi-class data with per-class bands and deterministic
/// jitter, column-major as the builder expects.
fn generate_classification(n_rows: usize, n_cols: usize, nclasses: usize) -> (Array2<f64>, Vec<u32>) {
    let labels: Vec<u32> = (0..n_rows).map(|i| (i % nclasses) as u32).collect();
    let mut values = Vec::with_capacity(n_rows * n_cols);
    for c in 0..n_cols {
        for i in 0..n_rows {
            let class = (i % nclasses) as f64;
            let jitter = ((i * 2654435761 + c * 40503) % 1000) as f64 / 1000.0;
            values.push(class * 3.0 + jitter * 2.0);
        }
    }
    (
        Array2::from_shape_vec((n_rows, n_cols).f(), values).unwrap(),
        labels,
    )
}

fn bench_grow(c: &mut Criterion) {
    let mut group = c.benchmark_group("grow_tree");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for &n_rows in &[10_000usize, 50_000, 100_000] {
        let n_cols = 16;
        let (data, labels) = generate_classification(n_rows, n_cols, 4);
        let params = DecisionTreeParams {
            max_depth: 10,
            n_bins: 64,
            ..Default::default()
        };
        let quantiles = compute_quantiles(data.view(), params.n_bins).unwrap();
        let rowids: Vec<u32> = (0..n_rows as u32).collect();
        let colids: Vec<usize> = (0..n_cols).collect();
        let input = QuantizedInput::new(
            data.view(),
            Labels::Classes(&labels),
            &rowids,
            &colids,
            quantiles.view(),
            4,
        )
        .unwrap();

        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_with_input(
            BenchmarkId::new("gini", n_rows),
            &input,
            |b, input| {
                b.iter(|| {
                    let tree = train_tree(&params, black_box(input)).unwrap();
                    black_box(tree.num_leaves)
                });
            },
        );
    }

    group.finish();
}

fn bench_criteria(c: &mut Criterion) {
    let mut group = c.benchmark_group("criteria");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let n_rows = 50_000usize;
    let n_cols = 16;
    let (data, labels) = generate_classification(n_rows, n_cols, 4);
    let params = DecisionTreeParams {
        max_depth: 10,
        n_bins: 64,
        ..Default::default()
    };
    let quantiles = compute_quantiles(data.view(), params.n_bins).unwrap();
    let rowids: Vec<u32> = (0..n_rows as u32).collect();
    let colids: Vec<usize> = (0..n_cols).collect();
    let input = QuantizedInput::new(
        data.view(),
        Labels::Classes(&labels),
        &rowids,
        &colids,
        quantiles.view(),
        4,
    )
    .unwrap();

    for criterion in [SplitCriterion::Gini, SplitCriterion::Entropy] {
        let params = DecisionTreeParams {
            split_criterion: criterion,
            ..params.clone()
        };
        group.throughput(Throughput::Elements(n_rows as u64));
        group.bench_function(BenchmarkId::new("criterion", format!("{criterion:?}")), |b| {
            b.iter(|| {
                let tree = train_tree(&params, black_box(&input)).unwrap();
                black_box(tree.num_leaves)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grow, bench_criteria);
criterion_main!(benches);
