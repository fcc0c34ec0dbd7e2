//! Simulation - Orchestrator & Public Surface
//!
//! # Lifecycle
//!
//! ```text
//!            start()                 stop()
//!   Idle ─────────────▶ Running ─────────────▶ Stopped ──┐
//!    ▲                                                    │ start()
//!    └────────────────────────────────────────────────────┘
//! ```
//!
//! Each `start()` builds a fresh [`ResourceManager`], [`EventBus`] and
//! statistics table, so runs never share state. After `stop()` the last
//! run's manager and bus stay in place: the final events can still be
//! polled and the final (idle) table inspected.
//!
//! Every query (`get_states`, `get_resource_graph`, `detect_deadlock`,
//! `poll_events`) takes a short lock on the manager or bus and never waits
//! on actor progress.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use super::philosopher::Philosopher;
use crate::config::SimulationConfig;
use crate::domain::events::{Event, EventBus};
use crate::domain::graph::{DeadlockDetector, ResourceGraph};
use crate::domain::resources::{ActorId, LedgerSnapshot, ResourceManager, Strategy};
use crate::domain::stats::{ActorStatistics, ActorStats};
use crate::domain::topology::Topology;
use crate::error::{Result, SimulationError};
use crate::infrastructure::{Pacer, Shutdown};

/// Live actor threads of one run
struct Run {
    shutdown: Arc<Shutdown>,
    handles: Vec<JoinHandle<()>>,
}

/// Dining philosophers simulation
pub struct Simulation {
    config: SimulationConfig,
    topology: Topology,
    manager: Arc<ResourceManager>,
    bus: Arc<EventBus>,
    stats: Arc<ActorStatistics>,
    run: Option<Run>,
}

impl Simulation {
    /// Simulation with `num_actors` actors, `num_forks` forks and default
    /// pacing
    ///
    /// # Errors
    /// `Config(InvalidActorCount)` if `num_actors == 0`.
    pub fn new(num_actors: usize, num_forks: usize) -> Result<Self> {
        Self::with_config(SimulationConfig::new(num_actors, num_forks))
    }

    /// Simulation from a full configuration
    ///
    /// # Errors
    /// `Config(..)` for the first invalid field.
    pub fn with_config(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let topology = Topology::new(config.num_actors, config.num_forks);
        let manager = Arc::new(Self::build_manager(&config, &topology));

        Ok(Self {
            bus: Arc::new(EventBus::new(config.event_capacity)?),
            stats: Arc::new(ActorStatistics::new(config.num_actors)),
            manager,
            topology,
            config,
            run: None,
        })
    }

    fn build_manager(config: &SimulationConfig, topology: &Topology) -> ResourceManager {
        ResourceManager::new(
            config.strategy,
            topology.num_forks(),
            topology.claims(),
            config.starvation_threshold(),
            config.retry_interval(),
        )
    }

    /// Select the strategy for the next run (`0` ordered, `1` banker)
    ///
    /// # Errors
    /// - `StrategyLocked` while running
    /// - `Config(InvalidStrategyCode)` for any other code
    pub fn set_strategy(&mut self, code: i32) -> Result<()> {
        if self.is_running() {
            return Err(SimulationError::StrategyLocked);
        }
        self.config.strategy = Strategy::from_code(code)?;
        info!(strategy = %self.config.strategy, "strategy selected");
        Ok(())
    }

    /// Spawn one thread per actor
    ///
    /// # Errors
    /// - `AlreadyRunning` if a run is live
    /// - `Spawn` if the OS refuses a thread; already-spawned actors are
    ///   stopped and joined before returning
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(SimulationError::AlreadyRunning);
        }

        self.manager = Arc::new(Self::build_manager(&self.config, &self.topology));
        self.bus = Arc::new(EventBus::new(self.config.event_capacity)?);
        self.stats = Arc::new(ActorStatistics::new(self.config.num_actors));

        let shutdown = Arc::new(Shutdown::new());
        let mut handles = Vec::with_capacity(self.config.num_actors);

        for idx in 0..self.config.num_actors {
            let id = ActorId(idx);
            let philosopher = Philosopher::new(
                id,
                self.topology.required_forks(id),
                Arc::clone(&self.manager),
                Arc::clone(&self.bus),
                Arc::clone(&self.stats),
                Arc::clone(&shutdown),
                Pacer::new(id, self.config.seed, self.config.think, self.config.eat),
            );

            let spawned = thread::Builder::new()
                .name(format!("philosopher-{idx}"))
                .spawn(move || philosopher.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    error!(actor = %id, error = %err, "failed to spawn actor thread");
                    self.halt(Run { shutdown, handles });
                    return Err(SimulationError::Spawn(err));
                }
            }
        }

        info!(
            actors = self.config.num_actors,
            forks = self.config.num_forks,
            strategy = %self.config.strategy,
            "simulation started"
        );
        self.run = Some(Run { shutdown, handles });
        Ok(())
    }

    /// Signal shutdown and join every actor thread
    ///
    /// # Errors
    /// `NotRunning` if there is no live run.
    pub fn stop(&mut self) -> Result<()> {
        let run = self.run.take().ok_or(SimulationError::NotRunning)?;
        self.halt(run);
        info!(meals = self.stats.total_meals(), "simulation stopped");
        Ok(())
    }

    fn halt(&self, run: Run) {
        run.shutdown.trigger();
        self.manager.wake_all();
        for handle in run.handles {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                warn!(thread = ?name, "actor thread panicked");
            }
        }
    }

    /// True between a successful `start()` and the matching `stop()`
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Drain every buffered event in sequence order
    pub fn poll_events(&self) -> Vec<Event> {
        self.bus.drain()
    }

    /// State codes (`0` thinking, `1` hungry, `2` eating), index = actor id
    pub fn get_states(&self) -> Vec<u8> {
        self.manager.states().into_iter().map(|s| s.code()).collect()
    }

    /// Current resource-allocation graph
    pub fn get_resource_graph(&self) -> ResourceGraph {
        ResourceGraph::from_snapshot(&self.manager.snapshot())
    }

    /// True iff the current wait-for graph has a cycle
    pub fn detect_deadlock(&self) -> bool {
        DeadlockDetector::detect(&self.get_resource_graph())
    }

    /// Actors on a wait-for cycle, empty when deadlock-free
    pub fn deadlocked_actors(&self) -> Vec<ActorId> {
        DeadlockDetector::deadlocked_actors(&self.get_resource_graph())
    }

    /// Full ownership table
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.manager.snapshot()
    }

    /// Strategy for the current (or next) run
    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// Active configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Actor-to-fork mapping
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Per-actor counters for the current (or last) run
    pub fn statistics(&self) -> Vec<ActorStats> {
        self.stats.snapshot()
    }

    /// Events dropped by buffer overflow in the current (or last) run
    pub fn evicted_events(&self) -> u64 {
        self.bus.evicted()
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            self.halt(run);
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingRange;
    use crate::error::ConfigError;

    fn fast(num_actors: usize, num_forks: usize) -> SimulationConfig {
        SimulationConfig::new(num_actors, num_forks)
            .with_think(PacingRange::new(1, 5))
            .with_eat(PacingRange::new(1, 5))
            .with_retry_interval_ms(2)
    }

    #[test]
    fn test_idle_queries_before_start() {
        let sim = Simulation::new(3, 3).unwrap();
        assert!(!sim.is_running());
        assert_eq!(sim.get_states(), vec![0, 0, 0]);
        assert!(sim.get_resource_graph().is_empty());
        assert!(!sim.detect_deadlock());
        assert!(sim.poll_events().is_empty());
    }

    #[test]
    fn test_zero_actors_rejected() {
        let err = Simulation::new(0, 2).unwrap_err();
        assert!(matches!(err, SimulationError::Config(ConfigError::InvalidActorCount(0))));
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut sim = Simulation::with_config(fast(2, 2)).unwrap();
        assert!(matches!(sim.stop(), Err(SimulationError::NotRunning)));

        sim.start().unwrap();
        assert!(matches!(sim.start(), Err(SimulationError::AlreadyRunning)));
        assert!(matches!(sim.set_strategy(1), Err(SimulationError::StrategyLocked)));
        sim.stop().unwrap();
        assert!(matches!(sim.stop(), Err(SimulationError::NotRunning)));
    }

    #[test]
    fn test_set_strategy_codes() {
        let mut sim = Simulation::new(2, 2).unwrap();
        sim.set_strategy(1).unwrap();
        assert_eq!(sim.strategy(), Strategy::Banker);
        assert!(matches!(
            sim.set_strategy(2),
            Err(SimulationError::Config(ConfigError::InvalidStrategyCode(2)))
        ));
        assert_eq!(sim.strategy(), Strategy::Banker, "unchanged on error");
    }

    #[test]
    fn test_stop_leaves_idle_table_and_drainable_events() {
        let mut sim = Simulation::with_config(fast(3, 3)).unwrap();
        sim.start().unwrap();
        thread::sleep(std::time::Duration::from_millis(50));
        sim.stop().unwrap();

        assert_eq!(sim.get_states(), vec![0, 0, 0]);
        assert!(sim.get_resource_graph().is_empty());
        let stopped = sim
            .poll_events()
            .iter()
            .filter(|e| e.details == "stopped")
            .count();
        assert_eq!(stopped, 3);
    }

    #[test]
    fn test_actor_fault_leaves_others_eating() {
        use crate::domain::events::EventKind;
        use crate::domain::resources::ActorState;
        use std::time::{Duration, Instant};

        let config = SimulationConfig::new(5, 5)
            .with_think(PacingRange::fixed(1))
            .with_eat(PacingRange::fixed(100))
            .with_retry_interval_ms(2);
        let mut sim = Simulation::with_config(config).unwrap();
        sim.start().unwrap();

        // Take actor 0's forks away mid-meal so its release fails
        let deadline = Instant::now() + Duration::from_secs(5);
        while sim.manager.states()[0] != ActorState::Eating {
            assert!(Instant::now() < deadline, "actor 0 never ate");
            thread::sleep(Duration::from_millis(1));
        }
        sim.manager.abandon(ActorId(0)).unwrap();

        let mut events = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        let ate_after_fault = |events: &[Event]| -> Vec<ActorId> {
            let Some(fault) = events
                .iter()
                .find(|e| e.kind == EventKind::Error && e.actor_id == ActorId(0))
            else {
                return Vec::new();
            };
            let mut ate: Vec<ActorId> = events
                .iter()
                .filter(|e| e.sequence > fault.sequence)
                .filter(|e| e.kind == EventKind::State && e.details == "EATING")
                .map(|e| e.actor_id)
                .collect();
            ate.sort();
            ate.dedup();
            ate
        };
        while Instant::now() < deadline {
            events.extend(sim.poll_events());
            if ate_after_fault(&events).len() == 4 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        let ate = ate_after_fault(&events);
        assert_eq!(ate, (1..5).map(ActorId).collect::<Vec<_>>());
        assert!(sim.is_running());
        sim.stop().unwrap();
    }

    #[test]
    fn test_drop_while_running_joins() {
        let mut sim = Simulation::with_config(fast(4, 4)).unwrap();
        sim.start().unwrap();
        drop(sim);
    }
}
