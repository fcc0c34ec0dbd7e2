//! Bounded Event Bus
//!
//! Multi-producer, single-consumer ring buffer. Producers (actor threads)
//! never block on capacity: when the buffer is full the oldest event is
//! evicted. The consumer drains everything at once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::warn;

use super::event::{Event, EventKind};
use crate::domain::resources::ActorId;
use crate::error::ConfigError;

/// Default ring capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 5000;

struct Ring {
    events: VecDeque<Event>,
    next_sequence: u64,
}

/// Thread-safe bounded telemetry sink
pub struct EventBus {
    ring: Mutex<Ring>,
    capacity: usize,
    epoch: Instant,
    evicted: AtomicU64,
}

impl EventBus {
    /// Create a bus holding at most `capacity` events
    ///
    /// # Errors
    /// `ZeroEventCapacity` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                events: VecDeque::with_capacity(capacity),
                next_sequence: 0,
            }),
            capacity,
            epoch: Instant::now(),
            evicted: AtomicU64::new(0),
        }
    }

    /// Append an event, evicting the oldest one if the ring is full.
    ///
    /// Returns the assigned sequence number.
    pub fn publish(&self, actor_id: ActorId, kind: EventKind, details: impl Into<String>) -> u64 {
        let details = details.into();
        let mut ring = self.ring.lock();

        let sequence = ring.next_sequence;
        ring.next_sequence += 1;
        // Timestamp taken under the lock so it is monotone in sequence
        let timestamp = self.epoch.elapsed();

        if ring.events.len() >= self.capacity {
            ring.events.pop_front();
            if self.evicted.fetch_add(1, Ordering::Relaxed) == 0 {
                warn!(capacity = self.capacity, "event buffer full, evicting oldest events");
            }
        }
        ring.events.push_back(Event {
            sequence,
            timestamp,
            actor_id,
            kind,
            details,
        });
        sequence
    }

    /// Remove and return every buffered event in publish order
    pub fn drain(&self) -> Vec<Event> {
        let mut ring = self.ring.lock();
        ring.events.drain(..).collect()
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.ring.lock().events.len()
    }

    /// True if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped by overflow since creation
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::build(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_returns_publish_order() {
        let bus = EventBus::new(10).unwrap();
        bus.publish(ActorId(0), EventKind::Lifecycle, "started");
        bus.publish(ActorId(1), EventKind::State, "HUNGRY");
        bus.publish(ActorId(0), EventKind::State, "EATING");

        let events = bus.drain();
        let seqs: Vec<_> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(events[1].details, "HUNGRY");
        assert!(bus.drain().is_empty(), "drain never duplicates");
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let bus = EventBus::new(3).unwrap();
        for i in 0..5 {
            bus.publish(ActorId(i), EventKind::State, "THINKING");
        }
        assert_eq!(bus.len(), 3);
        assert_eq!(bus.evicted(), 2);

        let events = bus.drain();
        let seqs: Vec<_> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            EventBus::new(0),
            Err(ConfigError::ZeroEventCapacity)
        ));

        let bus = EventBus::new(1).unwrap();
        bus.publish(ActorId(0), EventKind::Error, "boom");
        bus.publish(ActorId(0), EventKind::Error, "boom again");
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.evicted(), 1);
    }

    #[test]
    fn test_default_uses_default_capacity() {
        assert_eq!(EventBus::default().capacity(), DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_concurrent_publishers_total_order() {
        let bus = Arc::new(EventBus::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for _ in 0..500 {
                        bus.publish(ActorId(i), EventKind::State, "THINKING");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let events = bus.drain();
        assert_eq!(events.len(), 2000);
        for pair in events.windows(2) {
            assert_eq!(pair[1].sequence, pair[0].sequence + 1);
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }
}
