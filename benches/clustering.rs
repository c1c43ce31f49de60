use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use linfa_reasons::hdbscan::Hdbscan;
use linfa_reasons::k_means::{KMeans, KMeansInit};
use linfa_reasons::traits::Fit;
use ndarray::{concatenate, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

/// Sparse strength matrices, similar to vectorized explanations: each block of rows
/// concentrates its weight on a few feature columns
fn strength_blocks(n_rows: usize, n_blocks: usize, n_features: usize, rng: &mut Xoshiro256Plus) -> Array2<f64> {
    let per_block = n_rows / n_blocks;
    let blocks = (0..n_blocks)
        .map(|block| {
            let mut records = Array2::random_using((per_block, n_features), Uniform::new(0., 0.05), rng);
            for feature in (block..n_features).step_by(n_blocks).take(3) {
                records
                    .column_mut(feature)
                    .assign(&Array2::random_using((per_block, 1), Uniform::new(0.5, 1.), rng).column(0));
            }
            records
        })
        .collect::<Vec<_>>();
    let views = blocks.iter().map(|block| block.view()).collect::<Vec<_>>();
    concatenate(Axis(0), &views).unwrap()
}

fn k_means_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(40);
    let sizes = vec![(200, 4), (800, 6), (2000, 8)];

    let mut benchmark = c.benchmark_group("k_means");
    benchmark.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for (n_rows, n_clusters) in sizes {
        let records = strength_blocks(n_rows, n_clusters, 20, &mut rng);
        benchmark.bench_function(BenchmarkId::new("k_means", n_rows), |bencher| {
            bencher.iter(|| {
                KMeans::params_with_rng(black_box(n_clusters), rng.clone())
                    .init_method(KMeansInit::KMeansPlusPlus)
                    .n_runs(black_box(3))
                    .fit(&records)
                    .unwrap()
            });
        });
    }

    benchmark.finish();
}

fn hdbscan_bench(c: &mut Criterion) {
    let mut rng = Xoshiro256Plus::seed_from_u64(40);
    let sizes = vec![(200, 4), (800, 6), (2000, 8)];

    let mut benchmark = c.benchmark_group("hdbscan");
    benchmark.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for (n_rows, n_blocks) in sizes {
        let records = strength_blocks(n_rows, n_blocks, 20, &mut rng);
        benchmark.bench_function(BenchmarkId::new("hdbscan", n_rows), |bencher| {
            bencher.iter(|| {
                Hdbscan::params(black_box(10))
                    .min_samples(black_box(5))
                    .fit(&records)
                    .unwrap()
            });
        });
    }

    benchmark.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = k_means_bench, hdbscan_bench
}
criterion_main!(benches);
