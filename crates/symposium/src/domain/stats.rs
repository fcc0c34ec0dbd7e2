//! Per-Actor Statistics
//!
//! # Storage
//!
//! `DashMap<ActorId, ActorStats>`: every actor writes only its own entry, so
//! writers land on different shards and never contend with each other or
//! with a polling reader.
//!
//! ```text
//! ActorStatistics
//!   └─ entries: DashMap<ActorId, ActorStats>
//!        ├─ p0 -> { meals, total_wait, longest_wait }
//!        └─ ...
//! ```

use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::domain::resources::ActorId;

/// Counters for one actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    /// Completed Hungry → Eating transitions
    pub meals: u64,
    /// Sum of all Hungry → Eating waits
    pub total_wait: Duration,
    /// Longest single wait observed
    pub longest_wait: Duration,
}

impl ActorStats {
    /// Mean wait per meal, zero before the first meal
    pub fn mean_wait(&self) -> Duration {
        match u32::try_from(self.meals) {
            Ok(0) => Duration::ZERO,
            Ok(meals) => self.total_wait / meals,
            Err(_) => Duration::ZERO,
        }
    }
}

/// Concurrent statistics table for one run
#[derive(Debug)]
pub struct ActorStatistics {
    entries: DashMap<ActorId, ActorStats>,
    num_actors: usize,
}

impl ActorStatistics {
    /// Table with a zeroed entry per actor
    pub fn new(num_actors: usize) -> Self {
        let entries = DashMap::with_capacity(num_actors);
        for id in 0..num_actors {
            entries.insert(ActorId(id), ActorStats::default());
        }
        Self { entries, num_actors }
    }

    /// Record a meal that was preceded by a wait of `waited`
    pub fn record_meal(&self, actor: ActorId, waited: Duration) {
        let mut entry = self.entries.entry(actor).or_default();
        entry.meals += 1;
        entry.total_wait += waited;
        if waited > entry.longest_wait {
            entry.longest_wait = waited;
        }
    }

    /// Counters for one actor
    pub fn get(&self, actor: ActorId) -> Option<ActorStats> {
        self.entries.get(&actor).map(|entry| *entry)
    }

    /// Counters for every actor, in id order
    pub fn snapshot(&self) -> Vec<ActorStats> {
        (0..self.num_actors)
            .map(|id| self.get(ActorId(id)).unwrap_or_default())
            .collect()
    }

    /// Sum of meals across all actors
    pub fn total_meals(&self) -> u64 {
        self.entries.iter().map(|entry| entry.meals).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_meal_tracks_longest_wait() {
        let stats = ActorStatistics::new(2);
        stats.record_meal(ActorId(1), Duration::from_millis(30));
        stats.record_meal(ActorId(1), Duration::from_millis(10));

        let entry = stats.get(ActorId(1)).unwrap();
        assert_eq!(entry.meals, 2);
        assert_eq!(entry.longest_wait, Duration::from_millis(30));
        assert_eq!(entry.mean_wait(), Duration::from_millis(20));
        assert_eq!(stats.get(ActorId(0)).unwrap().meals, 0);
        assert_eq!(stats.get(ActorId(0)).unwrap().mean_wait(), Duration::ZERO);
    }

    #[test]
    fn test_concurrent_writers() {
        let stats = Arc::new(ActorStatistics::new(4));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..250 {
                        stats.record_meal(ActorId(i), Duration::from_micros(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.total_meals(), 1000);
        assert!(stats.snapshot().iter().all(|s| s.meals == 250));
    }
}
