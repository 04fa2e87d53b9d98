use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use data_colors::{assign::assign, distinct_colors, embed::embed,
                  ColorConstraint, Distance};

fn random_matrix(rows: usize, columns: usize) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(0);
    (0 .. rows)
        .map(|_| (0 .. columns).map(|_| rng.random_range(-1. .. 1.)).collect())
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let constraint = ColorConstraint::default();
    c.bench_function("distinct colors (20)", |b| {
        b.iter(|| distinct_colors(black_box(20), &constraint, Some(1)))
    });
    let m = random_matrix(150, 8);
    c.bench_function("embed 150 rows", |b| {
        b.iter(|| embed(black_box(&m), &Distance::Euclidean))
    });
    let ordering: Vec<usize> = (0 .. 150).rev().collect();
    c.bench_function("assign 150 rows to 12 colors", |b| {
        b.iter(|| assign(black_box(&ordering), 12))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
