//! Benchmarks for circuit construction
//!
//! Run with: cargo bench -p vqls-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vqls_ir::{Circuit, QubitId};

/// Layered Ry + CX block of the size used in measurement circuits.
fn layered(n: u32, layers: u32) -> Circuit {
    let mut circuit = Circuit::with_size("bench", n, 0);
    for layer in 0..layers {
        for j in 0..n {
            circuit.ry(0.1 * f64::from(j + layer), QubitId(j)).unwrap();
        }
        for j in 0..n.saturating_sub(1) {
            if (layer + j) % 2 == 0 {
                circuit.cx(QubitId(j), QubitId(j + 1)).unwrap();
            }
        }
    }
    circuit
}

fn bench_layered_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("layered_construction");
    for n in &[4u32, 8, 12] {
        group.bench_with_input(BenchmarkId::new("layers_8", n), n, |b, &n| {
            b.iter(|| layered(black_box(n), black_box(8)));
        });
    }
    group.finish();
}

fn bench_controlled_compose(c: &mut Criterion) {
    let block = layered(8, 8);
    let mapping: Vec<QubitId> = (0..8).map(QubitId).collect();
    c.bench_function("compose_controlled_8x8", |b| {
        b.iter(|| {
            let mut outer = Circuit::with_size("outer", 9, 0);
            outer
                .compose(black_box(&block), &mapping, Some(QubitId(8)))
                .unwrap();
            outer
        });
    });
}

fn bench_depth(c: &mut Criterion) {
    let circuit = layered(12, 16);
    c.bench_function("depth_12x16", |b| b.iter(|| black_box(&circuit).depth()));
}

criterion_group!(
    benches,
    bench_layered_construction,
    bench_controlled_compose,
    bench_depth
);
criterion_main!(benches);
