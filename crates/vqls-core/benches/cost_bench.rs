//! Benchmarks for operator algebra and cost evaluation
//!
//! Run with: cargo bench -p vqls-core

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vqls_adapter_sim::SimulatorBackend;
use vqls_core::{
    Ansatz, AnsatzVariant, CostFunction, EstimationMode, MeasurementEngine, PauliOperator,
};

fn reference_operator() -> PauliOperator {
    PauliOperator::from_labels([(1.0, "IZZI"), (2.0, "ZZZZ"), (-0.5, "IIIZ")]).unwrap()
}

fn bench_compose_simplify(c: &mut Criterion) {
    let labels = ["XZIY", "ZZZZ", "IIIZ", "YXXI", "ZIZI", "XXYY"];
    let op = PauliOperator::from_labels(labels.iter().enumerate().map(|(k, l)| (0.1 * k as f64 + 0.5, *l)))
        .unwrap();
    c.bench_function("compose_simplify_6_terms", |b| {
        b.iter(|| black_box(&op).compose(black_box(&op)).unwrap().simplify());
    });
}

fn bench_cost_evaluation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("cost_evaluate");
    for mode in [EstimationMode::Surrogate, EstimationMode::SwapTest] {
        let engine = MeasurementEngine::new(Arc::new(SimulatorBackend::new()), 0).unwrap();
        let cost = CostFunction::new(
            reference_operator(),
            Ansatz::new(4, 8, AnsatzVariant::Rotation),
            mode,
            engine,
        )
        .unwrap();
        let theta: Vec<f64> = (0..32).map(|k| 0.05 * f64::from(k)).collect();
        group.bench_with_input(BenchmarkId::new("reference", mode), &theta, |b, theta| {
            b.iter(|| rt.block_on(cost.evaluate(black_box(theta))).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compose_simplify, bench_cost_evaluation);
criterion_main!(benches);
