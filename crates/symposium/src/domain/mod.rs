//! Domain Layer - Pure Simulation Logic
//!
//! Everything here is synchronous, deterministic given its inputs, and free
//! of thread spawning. The only blocking primitive is the condvar wait
//! inside [`ResourceManager::acquire`].
//!
//! # Modules
//!
//! - [`resources`]: fork ownership, strategies, blocking acquisition
//! - [`graph`]: resource-allocation graph and deadlock detection
//! - [`events`]: bounded telemetry bus
//! - [`topology`]: actor-to-fork mapping
//! - [`stats`]: per-actor meal and wait counters

pub mod events;
pub mod graph;
pub mod resources;
pub mod stats;
pub mod topology;

// Re-exports
pub use events::{Event, EventBus, EventKind, DEFAULT_EVENT_CAPACITY};
pub use graph::{DeadlockDetector, EdgeKind, GraphEdge, ResourceGraph, WaitForGraph};
pub use resources::{
    AcquireOutcome, ActorId, ActorState, CancelToken, ForkId, ForkSet, Ledger, LedgerSnapshot,
    RequestResult, ResourceError, ResourceManager, Strategy,
};
pub use stats::{ActorStatistics, ActorStats};
pub use topology::Topology;
