//! Telemetry Event Types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::resources::ActorId;

/// Event category
///
/// Serialized in upper case (`"STATE"`, `"LIFECYCLE"`, `"ERROR"`), which is
/// the form consumers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    /// Actor state transition; details carry the new state name
    State,
    /// Actor thread started or stopped
    Lifecycle,
    /// Actor fault; details carry the rendered error
    Error,
}

impl EventKind {
    /// Upper-case name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "STATE",
            Self::Lifecycle => "LIFECYCLE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable telemetry record
///
/// # Ordering
///
/// `sequence` is assigned by the bus under its lock, so it totally orders
/// every event of a run and matches drain order. `timestamp` is measured
/// from the bus epoch and is monotone in `sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position in the run's total order, starting at 0
    pub sequence: u64,
    /// Elapsed time since the bus was created
    pub timestamp: Duration,
    /// Emitting actor
    pub actor_id: ActorId,
    /// Category
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    /// Free-form payload
    pub details: String,
}

impl Event {
    /// Timestamp as fractional seconds
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }

    /// True for a STATE event whose details equal `state_name`
    pub fn is_state(&self, state_name: &str) -> bool {
        self.kind == EventKind::State && self.details == state_name
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{:.3}s] {} {} {}",
            self.sequence,
            self.timestamp_secs(),
            self.actor_id,
            self.kind,
            self.details
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = Event {
            sequence: 7,
            timestamp: Duration::from_millis(1500),
            actor_id: ActorId(3),
            kind: EventKind::State,
            details: "EATING".into(),
        };
        assert_eq!(event.to_string(), "#7 [1.500s] p3 STATE EATING");
        assert!(event.is_state("EATING"));
        assert!(!event.is_state("HUNGRY"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EventKind::Lifecycle.as_str(), "LIFECYCLE");
        assert_eq!(EventKind::Error.to_string(), "ERROR");
    }
}
