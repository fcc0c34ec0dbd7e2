//! Error types for the simulation surface.
//!
//! Two layers, mirroring how the engine fails:
//!
//! - [`ConfigError`]: rejected input, raised at construction or
//!   configuration time. Values are never clamped into range.
//! - [`SimulationError`]: everything the orchestrator can refuse, including
//!   lifecycle misuse (`start` twice, `stop` while idle).
//!
//! Fork-level faults live next to the ledger as
//! [`ResourceError`](crate::domain::resources::ResourceError); they never
//! escape an actor thread and surface as ERROR events instead.

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Configuration Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Invalid simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A simulation needs at least one actor
    #[error("actor count must be at least 1, got {0}")]
    InvalidActorCount(usize),

    /// Strategy code outside the known set
    #[error("unknown strategy code {0} (expected 0 = ordered, 1 = banker)")]
    InvalidStrategyCode(i32),

    /// Pacing range with `min_ms > max_ms`
    #[error("invalid {name} range: min {min_ms}ms exceeds max {max_ms}ms")]
    InvertedRange {
        /// Which range was rejected
        name: &'static str,
        /// Lower bound
        min_ms: u64,
        /// Upper bound
        max_ms: u64,
    },

    /// The event buffer must hold at least one event
    #[error("event capacity must be at least 1")]
    ZeroEventCapacity,

    /// Acquire retry interval of zero would spin
    #[error("retry interval must be non-zero")]
    ZeroRetryInterval,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Simulation Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Errors returned by [`Simulation`](crate::Simulation)
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Rejected configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `start()` while actor threads are live
    #[error("simulation is already running")]
    AlreadyRunning,

    /// `stop()` with no live run
    #[error("simulation is not running")]
    NotRunning,

    /// Strategy is fixed for the lifetime of a run
    #[error("strategy cannot change while the simulation is running")]
    StrategyLocked,

    /// OS refused to spawn an actor thread
    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Convenience alias used throughout the public surface
pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
