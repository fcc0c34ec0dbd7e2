//! Symposium - Dining Philosophers Simulation Engine
//!
//! # Overview
//!
//! `symposium` runs N actors ("philosophers") on their own OS threads,
//! competing for M exclusive forks. The engine guarantees mutual exclusion
//! on every fork and avoids deadlock and starvation, while exposing
//! read-only snapshots for renderers and test harnesses.
//!
//! # Trinity Architecture
//!
//! This crate follows the Trinity Architecture pattern:
//!
//! - **Domain**: fork ownership, allocation strategies, graphs, telemetry
//! - **Infrastructure**: shutdown signalling and randomized pacing
//! - **Adapters**: actor threads and the [`Simulation`] control surface
//!
//! # Guarantees
//!
//! ## Safety
//! - **Mutual exclusion**: a fork has at most one holder in every snapshot
//! - **Atomic grants**: no observer sees a half-granted banker request
//!
//! ## Liveness
//! - **Deadlock freedom**: ordered acquisition never closes a wait-for
//!   cycle; banker grants only keep the table in a safe state
//! - **Starvation freedom**: requests pending past the starvation threshold
//!   reserve the forks they are blocked on against newer requests
//!
//! ## Telemetry
//! - **Bounded**: at most `event_capacity` events buffered, oldest evicted
//! - **Ordered**: sequence numbers totally order a run's events
//!
//! # Usage
//!
//! ```rust
//! use symposium::{PacingRange, Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::new(5, 5)
//!     .with_think(PacingRange::new(1, 5))
//!     .with_eat(PacingRange::new(1, 5));
//!
//! let mut sim = Simulation::with_config(config).unwrap();
//! sim.set_strategy(1).unwrap(); // banker
//! sim.start().unwrap();
//!
//! std::thread::sleep(std::time::Duration::from_millis(50));
//! assert!(!sim.detect_deadlock());
//! assert_eq!(sim.get_states().len(), 5);
//!
//! sim.stop().unwrap();
//! let events = sim.poll_events();
//! assert!(events.iter().any(|e| e.details == "started"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Trinity Architecture Layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

pub mod config;
pub mod error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Control surface
pub use adapters::Simulation;
pub use config::{PacingRange, SimulationConfig};
pub use error::{ConfigError, Result, SimulationError};

// Resource types
pub use domain::{
    AcquireOutcome, ActorId, ActorState, ForkId, ForkSet, LedgerSnapshot, RequestResult,
    ResourceError, ResourceManager, Strategy,
};

// Graph types
pub use domain::{DeadlockDetector, EdgeKind, GraphEdge, ResourceGraph, WaitForGraph};

// Telemetry types
pub use domain::{ActorStats, Event, EventBus, EventKind, DEFAULT_EVENT_CAPACITY};

// Topology
pub use domain::Topology;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
