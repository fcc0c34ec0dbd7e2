//! Shared helpers for integration tests

#![allow(dead_code)]

use std::time::{Duration, Instant};

use symposium::{PacingRange, Simulation, SimulationConfig, Strategy};
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Millisecond-scale pacing so scenarios finish in well under a second
pub fn fast_config(num_actors: usize, num_forks: usize, strategy: Strategy) -> SimulationConfig {
    SimulationConfig::new(num_actors, num_forks)
        .with_strategy(strategy)
        .with_think(PacingRange::new(1, 5))
        .with_eat(PacingRange::new(1, 5))
        .with_retry_interval_ms(2)
        .with_starvation_threshold_ms(50)
        .with_seed(0x5EED)
}

/// Both strategies, for scenario loops
pub const STRATEGIES: [Strategy; 2] = [Strategy::Ordered, Strategy::Banker];

/// Call `probe` every `every` until `duration` elapsed
pub fn sample_for(
    sim: &Simulation,
    duration: Duration,
    every: Duration,
    mut probe: impl FnMut(&Simulation),
) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        probe(sim);
        std::thread::sleep(every);
    }
}

/// Assert the ownership table is consistent: one holder per fork, and every
/// eating actor holds exactly its required set
pub fn assert_mutual_exclusion(sim: &Simulation) {
    let snapshot = sim.snapshot();
    let graph = sim.get_resource_graph();

    for fork in 0..sim.topology().num_forks() {
        let holders = graph.allocations_of(symposium::ForkId(fork));
        assert!(holders.len() <= 1, "fork f{fork} held by {holders:?}");
    }
    for actor in &snapshot.actors {
        if actor.state == symposium::ActorState::Eating {
            assert_eq!(actor.held, sim.topology().required_forks(actor.id));
        }
        assert!(!actor.held.intersects(&actor.requested));
    }
}
