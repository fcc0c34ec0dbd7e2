//! Simulation Configuration
//!
//! Pure data plus validation. Nothing here is clamped: an out-of-range value
//! is a [`ConfigError`], never silently corrected.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::events::DEFAULT_EVENT_CAPACITY;
use crate::domain::resources::Strategy;
use crate::error::ConfigError;

/// Default think/eat interval bounds
pub const DEFAULT_PACING: PacingRange = PacingRange::new(500, 1000);

/// Default interval between re-checks of a blocked acquire
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 50;

/// Default age at which a pending request gains priority
///
/// Ten retry intervals.
pub const DEFAULT_STARVATION_THRESHOLD_MS: u64 = 500;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pacing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inclusive millisecond range a random interval is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingRange {
    /// Lower bound (ms)
    pub min_ms: u64,
    /// Upper bound (ms)
    pub max_ms: u64,
}

impl PacingRange {
    /// Create a range
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Degenerate range that always yields `ms`
    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvertedRange {
                name,
                min_ms: self.min_ms,
                max_ms: self.max_ms,
            });
        }
        Ok(())
    }
}

impl Default for PacingRange {
    fn default() -> Self {
        DEFAULT_PACING
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Simulation Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything a [`Simulation`](crate::Simulation) needs before `start()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of actors (at least 1)
    pub num_actors: usize,

    /// Number of forks (may be 0)
    pub num_forks: usize,

    /// Allocation strategy used by the next run
    pub strategy: Strategy,

    /// Think interval
    pub think: PacingRange,

    /// Eat interval
    pub eat: PacingRange,

    /// Upper bound on a single wait inside a blocking acquire
    ///
    /// Waiters are normally woken by releases; this bounds how late they
    /// notice aging or shutdown.
    pub retry_interval_ms: u64,

    /// Age after which a pending request reserves its forks against newer
    /// requests
    pub starvation_threshold_ms: u64,

    /// Event ring capacity
    pub event_capacity: usize,

    /// RNG seed for reproducible pacing; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_actors: 5,
            num_forks: 5,
            strategy: Strategy::default(),
            think: DEFAULT_PACING,
            eat: DEFAULT_PACING,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            starvation_threshold_ms: DEFAULT_STARVATION_THRESHOLD_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Default configuration for `num_actors` actors and `num_forks` forks
    pub fn new(num_actors: usize, num_forks: usize) -> Self {
        Self {
            num_actors,
            num_forks,
            ..Self::default()
        }
    }

    /// Set the strategy
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the think interval
    pub fn with_think(mut self, think: PacingRange) -> Self {
        self.think = think;
        self
    }

    /// Set the eat interval
    pub fn with_eat(mut self, eat: PacingRange) -> Self {
        self.eat = eat;
        self
    }

    /// Set the acquire re-check interval
    pub fn with_retry_interval_ms(mut self, ms: u64) -> Self {
        self.retry_interval_ms = ms;
        self
    }

    /// Set the starvation threshold
    pub fn with_starvation_threshold_ms(mut self, ms: u64) -> Self {
        self.starvation_threshold_ms = ms;
        self
    }

    /// Set the event ring capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Seed the pacing RNGs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every field
    ///
    /// # Errors
    /// The first violated constraint, in field order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_actors == 0 {
            return Err(ConfigError::InvalidActorCount(self.num_actors));
        }
        self.think.validate("think")?;
        self.eat.validate("eat")?;
        if self.retry_interval_ms == 0 {
            return Err(ConfigError::ZeroRetryInterval);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }

    /// Re-check interval as a [`Duration`]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// Starvation threshold as a [`Duration`]
    pub fn starvation_threshold(&self) -> Duration {
        Duration::from_millis(self.starvation_threshold_ms)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.event_capacity, 5000);
        assert_eq!(config.think, PacingRange::new(500, 1000));
        assert_eq!(config.retry_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_actors_rejected() {
        assert_eq!(
            SimulationConfig::new(0, 3).validate(),
            Err(ConfigError::InvalidActorCount(0))
        );
        assert!(SimulationConfig::new(1, 0).validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = SimulationConfig::new(2, 2).with_eat(PacingRange::new(10, 5));
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedRange { name: "eat", min_ms: 10, max_ms: 5 })
        );
    }

    #[test]
    fn test_zero_capacity_and_retry_rejected() {
        let config = SimulationConfig::new(2, 2).with_event_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroEventCapacity));

        let config = SimulationConfig::new(2, 2).with_retry_interval_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetryInterval));
    }

    #[test]
    fn test_builder_chain() {
        let config = SimulationConfig::new(3, 3)
            .with_strategy(Strategy::Banker)
            .with_think(PacingRange::fixed(1))
            .with_starvation_threshold_ms(20)
            .with_seed(7);
        assert_eq!(config.strategy, Strategy::Banker);
        assert_eq!(config.think, PacingRange::new(1, 1));
        assert_eq!(config.starvation_threshold(), Duration::from_millis(20));
        assert_eq!(config.seed, Some(7));
    }
}
