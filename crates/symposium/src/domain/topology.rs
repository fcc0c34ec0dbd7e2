//! Fork Assignment
//!
//! Actor `i` of `n` sits between forks
//!
//! ```text
//! left  = ⌊i·m / n⌋
//! right = (left + 1) mod m
//! ```
//!
//! deduplicated, so with `n == m` this is the classic ring `{i, i+1}`, with
//! `m == 1` every actor shares the single fork, and `m == 0` leaves every
//! actor with an empty set.

use crate::domain::resources::{ActorId, ForkId, ForkSet};

/// Static actor-to-fork mapping for one simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    num_actors: usize,
    num_forks: usize,
    required: Vec<ForkSet>,
}

impl Topology {
    /// Compute the mapping for `num_actors` actors and `num_forks` forks
    pub fn new(num_actors: usize, num_forks: usize) -> Self {
        let required = (0..num_actors)
            .map(|i| Self::assign(i, num_actors, num_forks))
            .collect();
        Self {
            num_actors,
            num_forks,
            required,
        }
    }

    fn assign(actor: usize, num_actors: usize, num_forks: usize) -> ForkSet {
        if num_forks == 0 || num_actors == 0 {
            return ForkSet::new();
        }
        let left = actor * num_forks / num_actors;
        let right = (left + 1) % num_forks;
        [ForkId(left), ForkId(right)].into_iter().collect()
    }

    /// Number of actors
    pub fn num_actors(&self) -> usize {
        self.num_actors
    }

    /// Number of forks
    pub fn num_forks(&self) -> usize {
        self.num_forks
    }

    /// Forks `actor` needs in order to eat; empty for unknown actors
    pub fn required_forks(&self, actor: ActorId) -> ForkSet {
        self.required
            .get(actor.as_usize())
            .cloned()
            .unwrap_or_default()
    }

    /// Every actor's required set, in id order (the banker claim matrix)
    pub fn claims(&self) -> Vec<ForkSet> {
        self.required.clone()
    }
}
