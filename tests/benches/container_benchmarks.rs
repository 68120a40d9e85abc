//! # Container Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | Build | Instantiate and wire a registry |
//! | Resolution | `pick` and reads through a wire |
//! | Change bus | Dispatch with N listeners attached |
//! | Snapshot | Capture and restore persisted fields |
//! | Lifecycle | Ordered and parallel invocation |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use stitch_runtime::{Container, ServiceId};
use stitch_tests::fixtures::{cyclic_registry, staged_container, Hello, Test};

// ============================================================================
// Build and resolution
// ============================================================================

fn bench_container_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("container-build");
    let registry = cyclic_registry(true);

    group.bench_function("build_cyclic_pair", |b| {
        b.iter(|| black_box(Container::build(&registry).is_ok()))
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("container-resolution");
    let container = Container::build(&cyclic_registry(true)).unwrap();
    let hello = container.pick::<Hello>().unwrap();

    group.bench_function("pick", |b| {
        b.iter(|| black_box(container.pick::<Test>().is_ok()))
    });

    group.bench_function("wire_round_trip", |b| {
        b.iter(|| {
            let around = hello.test.get().and_then(|test| test.hello.get());
            black_box(around.map(|h| h.counter.get()).unwrap_or_default())
        })
    });

    group.finish();
}

// ============================================================================
// Change bus
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("change-bus");

    for listeners in [1usize, 10, 100] {
        let container = Container::build(&cyclic_registry(true)).unwrap();
        let subscriptions: Vec<_> = (0..listeners)
            .map(|_| {
                container.listen(|id, key, value| {
                    black_box((id, key, value));
                })
            })
            .collect();
        let hello = container.pick::<Hello>().unwrap();

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(
            BenchmarkId::new("set_distinct", listeners),
            &listeners,
            |b, _| b.iter(|| hello.counter.update(|n| n + 1)),
        );
        group.bench_with_input(
            BenchmarkId::new("dispatch_direct", listeners),
            &listeners,
            |b, _| b.iter(|| container.bus().dispatch(ServiceId(0), "counter", &json!(1))),
        );

        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
    }

    group.finish();
}

// ============================================================================
// Snapshot
// ============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    let container = Container::build(&cyclic_registry(true)).unwrap();
    container.pick::<Hello>().unwrap().counter.set(7);
    let snapshot = container.snapshot();

    group.bench_function("capture", |b| b.iter(|| black_box(container.snapshot())));
    group.bench_function("restore", |b| {
        b.iter(|| black_box(container.restore(&snapshot)))
    });
    group.bench_function("to_json", |b| b.iter(|| black_box(snapshot.to_json().is_ok())));

    group.finish();
}

// ============================================================================
// Lifecycle
// ============================================================================

fn bench_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifecycle");
    group.measurement_time(Duration::from_secs(5));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let (container, _ledger) = staged_container();

    group.bench_function("ordered_invoke_3", |b| {
        b.iter(|| {
            runtime
                .block_on(container.ordered_invoke("stage", vec![json!(0)]))
                .is_ok()
        })
    });

    group.bench_function("invoke_3", |b| {
        b.iter(|| {
            runtime
                .block_on(container.invoke("stage", vec![json!(0)]))
                .is_ok()
        })
    });

    group.bench_function("undefined_method", |b| {
        b.iter(|| {
            runtime
                .block_on(container.ordered_invoke("missing", Vec::new()))
                .is_ok()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_container_build,
    bench_resolution,
    bench_dispatch,
    bench_snapshot,
    bench_lifecycle,
);
criterion_main!(benches);
