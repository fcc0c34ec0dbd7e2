//! Core Types for Fork Ownership

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Actor (philosopher) identifier
///
/// Actor ids are dense: a simulation with `n` actors uses ids `0..n`, and the
/// id doubles as the index into every per-actor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub usize);

impl ActorId {
    /// Create a new actor identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying usize value
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Fork identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForkId(pub usize);

impl ForkId {
    /// Create a new fork identifier
    #[inline(always)]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying usize value
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// A set of forks, always iterated in ascending index order.
///
/// Ascending iteration is what the ordered strategy relies on: walking a
/// `ForkSet` front to back is the global acquisition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForkSet(BTreeSet<ForkId>);

impl ForkSet {
    /// Empty set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Number of forks in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the set holds no forks
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Membership test
    pub fn contains(&self, fork: ForkId) -> bool {
        self.0.contains(&fork)
    }

    /// Add a fork, returning false if it was already present
    pub fn insert(&mut self, fork: ForkId) -> bool {
        self.0.insert(fork)
    }

    /// Remove a fork, returning false if it was absent
    pub fn remove(&mut self, fork: ForkId) -> bool {
        self.0.remove(&fork)
    }

    /// Forks in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ForkId> + '_ {
        self.0.iter().copied()
    }

    /// Lowest-indexed fork
    pub fn first(&self) -> Option<ForkId> {
        self.0.first().copied()
    }

    /// True if the two sets share at least one fork
    pub fn intersects(&self, other: &ForkSet) -> bool {
        self.iter().any(|f| other.contains(f))
    }

    /// Forks in `self` that are not in `other`
    pub fn difference(&self, other: &ForkSet) -> ForkSet {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// Remove every fork in `other` from `self`
    pub fn remove_all(&mut self, other: &ForkSet) {
        for fork in other.iter() {
            self.0.remove(&fork);
        }
    }

    /// Drop all forks
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<ForkId> for ForkSet {
    fn from_iter<I: IntoIterator<Item = ForkId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ForkSet {
    type Item = ForkId;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, ForkId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl fmt::Display for ForkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, fork) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", fork)?;
        }
        write!(f, "}}")
    }
}

/// Actor lifecycle state
///
/// The numeric codes are the snapshot contract consumed by renderers:
/// `0 = Thinking`, `1 = Hungry`, `2 = Eating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorState {
    /// Not holding or requesting anything
    #[default]
    Thinking = 0,
    /// Waiting for (part of) the required fork set
    Hungry = 1,
    /// Holding exactly the required fork set
    Eating = 2,
}

impl ActorState {
    /// Snapshot code
    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case name used in STATE event details
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thinking => "THINKING",
            Self::Hungry => "HUNGRY",
            Self::Eating => "EATING",
        }
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by the resource manager
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Actor id out of bounds
    #[error("unknown actor: {0}")]
    UnknownActor(ActorId),

    /// Fork id out of bounds
    #[error("unknown fork: {0}")]
    UnknownFork(ForkId),

    /// Release attempted with a set that differs from what the actor holds
    #[error("actor {actor} released {released} but holds {held}")]
    OwnershipMismatch {
        /// Actor attempting the release
        actor: ActorId,
        /// Set passed to release
        released: ForkSet,
        /// Set actually held
        held: ForkSet,
    },

    /// Acquire attempted while a previous request is still outstanding
    #[error("actor {actor} already has a pending request for {pending}")]
    RequestPending {
        /// Requesting actor
        actor: ActorId,
        /// The outstanding request
        pending: ForkSet,
    },

    /// Acquire attempted while the actor still holds forks from a grant
    #[error("actor {actor} still holds {held}")]
    AlreadyHolding {
        /// Requesting actor
        actor: ActorId,
        /// Forks it has not released
        held: ForkSet,
    },
}
