//! Safety & Detection Benchmark Suite
//!
//! # Scenarios
//!
//! 1. **Banker safety check**: half the table eating, the other half
//!    hungry; cost of `is_safe_after` as the table grows
//! 2. **Deadlock detection**: full ring deadlock (worst case, cycle found
//!    at the end of the DFS) vs. a chain with no cycle
//! 3. **Uncontended acquire/release**: lock + ledger round trip

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use symposium::domain::resources::Ledger;
use symposium::{
    ActorId, DeadlockDetector, EdgeKind, ForkId, ForkSet, GraphEdge, ResourceGraph,
    ResourceManager, Strategy, Topology,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Ring table where every even actor eats and every odd actor waits
fn half_eating_ledger(n: usize) -> Ledger {
    let topology = Topology::new(n, n);
    let mut ledger = Ledger::new(Strategy::Banker, n, topology.claims());
    let now = Instant::now();
    let threshold = Duration::from_secs(3600);

    for idx in 0..n {
        let id = ActorId(idx);
        let forks = topology.required_forks(id);
        if ledger.register(id, &forks, now).is_err() {
            continue;
        }
        if idx % 2 == 0 && idx + 1 < n {
            let _ = ledger.grant_whole(id, now, threshold, false);
        }
    }
    ledger
}

fn edge(actor: usize, fork: usize, kind: EdgeKind) -> GraphEdge {
    GraphEdge {
        actor_id: ActorId(actor),
        fork_id: ForkId(fork),
        kind,
    }
}

/// Everyone holds their left fork and requests their right one
fn ring_deadlock(n: usize) -> ResourceGraph {
    ResourceGraph::from_edges((0..n).flat_map(|i| {
        [
            edge(i, i, EdgeKind::Allocation),
            edge(i, (i + 1) % n, EdgeKind::Request),
        ]
    }))
}

/// Same shape with the last actor eating, so the chain never closes
fn waiting_chain(n: usize) -> ResourceGraph {
    ResourceGraph::from_edges((0..n).flat_map(|i| {
        let kind = if i + 1 == n { EdgeKind::Allocation } else { EdgeKind::Request };
        [edge(i, i, EdgeKind::Allocation), edge(i, (i + 1) % n, kind)]
    }))
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_safety_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("banker_safety");
    for n in [5, 20, 100] {
        let ledger = half_eating_ledger(n);
        let candidate = ActorId(n - 1);
        let forks: ForkSet = [ForkId(n - 1)].into_iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(ledger.is_safe_after(candidate, &forks)));
        });
    }
    group.finish();
}

fn bench_deadlock_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("deadlock_detection");
    for n in [5, 50, 500] {
        let deadlocked = ring_deadlock(n);
        let chain = waiting_chain(n);
        group.bench_with_input(BenchmarkId::new("ring", n), &deadlocked, |b, graph| {
            b.iter(|| black_box(DeadlockDetector::detect(graph)));
        });
        group.bench_with_input(BenchmarkId::new("chain", n), &chain, |b, graph| {
            b.iter(|| black_box(DeadlockDetector::detect(graph)));
        });
    }
    group.finish();
}

fn bench_acquire_release(c: &mut Criterion) {
    let topology = Topology::new(5, 5);
    let cancel = AtomicBool::new(false);

    for strategy in [Strategy::Ordered, Strategy::Banker] {
        let manager = ResourceManager::new(
            strategy,
            5,
            topology.claims(),
            Duration::from_secs(3600),
            Duration::from_millis(50),
        );
        let forks = topology.required_forks(ActorId(0));
        c.bench_function(&format!("acquire_release/{strategy}"), |b| {
            b.iter(|| {
                let _ = manager.acquire(ActorId(0), &forks, &cancel);
                let _ = manager.release(ActorId(0), &forks);
            });
        });
    }
}

criterion_group!(
    benches,
    bench_safety_check,
    bench_deadlock_detection,
    bench_acquire_release
);
criterion_main!(benches);
