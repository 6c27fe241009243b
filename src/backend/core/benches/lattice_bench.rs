//! Benchmarks for lattice construction and predicate evaluation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cutline_core::clock::{ProcessId, VectorClock};
use cutline_core::detection::PredicateEvaluator;
use cutline_core::events::{Event, EventLog};
use cutline_core::lattice::{build_lattice, ProcessPair};

/// Two processes with no messages: the lattice is the full n×n grid.
fn independent_logs(n: u64) -> Vec<EventLog<u64>> {
    (0..2)
        .map(|p| {
            let mut log = EventLog::new(ProcessId(p), 2);
            for k in 1..=n {
                let mut slots = vec![0; 2];
                slots[p] = k;
                log.append(Event::new(k, VectorClock::from_slots(ProcessId(p), slots)));
            }
            log
        })
        .collect()
}

/// Two processes exchanging a message after every event: the lattice is a
/// narrow band around the diagonal.
fn ping_pong_logs(n: u64) -> Vec<EventLog<u64>> {
    (0..2)
        .map(|p| {
            let other = 1 - p;
            let mut log = EventLog::new(ProcessId(p), 2);
            for k in 1..=n {
                let mut slots = vec![0; 2];
                slots[p] = k;
                slots[other] = k - 1;
                log.append(Event::new(k, VectorClock::from_slots(ProcessId(p), slots)));
            }
            log
        })
        .collect()
}

fn pair() -> ProcessPair {
    ProcessPair::new(ProcessId(0), ProcessId(1))
}

fn bench_lattice_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("lattice_construction");
    for size in [8u64, 32, 128] {
        group.throughput(Throughput::Elements(size * size));
        group.bench_with_input(BenchmarkId::new("independent", size), &size, |b, &n| {
            let logs = independent_logs(n);
            b.iter(|| black_box(build_lattice(&logs, pair())));
        });
        group.bench_with_input(BenchmarkId::new("ping_pong", size), &size, |b, &n| {
            let logs = ping_pong_logs(n);
            b.iter(|| black_box(build_lattice(&logs, pair())));
        });
    }
    group.finish();
}

fn bench_possibly(c: &mut Criterion) {
    let mut group = c.benchmark_group("possibly");
    for size in [8u64, 32, 128] {
        let logs = independent_logs(size);
        let lattice = build_lattice(&logs, pair());
        let evaluator = PredicateEvaluator::new(&lattice, &logs);

        // Holds only at the sink, so every level is visited.
        group.bench_with_input(BenchmarkId::new("sink_only", size), &size, |b, &n| {
            let at_sink = move |x: &u64, y: &u64| *x == n && *y == n;
            b.iter(|| black_box(evaluator.possibly(&at_sink)));
        });
    }
    group.finish();
}

fn bench_definitely(c: &mut Criterion) {
    let mut group = c.benchmark_group("definitely");
    for size in [8u64, 32, 128] {
        let logs = independent_logs(size);
        let lattice = build_lattice(&logs, pair());
        let evaluator = PredicateEvaluator::new(&lattice, &logs);

        // A cut across the whole grid: every path crosses a + b == n.
        group.bench_with_input(BenchmarkId::new("diagonal_cut", size), &size, |b, &n| {
            let cut = move |x: &u64, y: &u64| x + y == n;
            b.iter(|| black_box(evaluator.definitely(&cut)));
        });
        group.bench_with_input(BenchmarkId::new("never", size), &size, |b, _| {
            let never = |_: &u64, _: &u64| false;
            b.iter(|| black_box(evaluator.definitely(&never)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_lattice_construction, bench_possibly, bench_definitely);
criterion_main!(benches);
