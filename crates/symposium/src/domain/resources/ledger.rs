//! Ownership Ledger - the single source of truth for who holds what
//!
//! # Model
//!
//! ```text
//! holders:  [Fork  -> Actor | None]
//! actors:   [Actor -> { state, claim, held, outstanding, pending }]
//! ```
//!
//! The ledger is plain data: no locks, no waiting. The
//! [`ResourceManager`](super::ResourceManager) wraps it in a mutex and owns
//! every blocking decision; everything here runs inside that critical
//! section and is O(actors × forks) at worst.
//!
//! # Invariants
//!
//! - A fork has at most one holder, and `holders[f] == Some(a)` iff
//!   `f ∈ actors[a].held`.
//! - `held ∩ outstanding = ∅`.
//! - `Eating` iff the actor has no pending request and holds a granted set.
//! - `Hungry` iff a request is pending.
//! - An actor has a pending request or a denied-request marker, never both.

use std::time::{Duration, Instant};

use super::strategy::Strategy;
use super::types::{ActorId, ActorState, ForkId, ForkSet, ResourceError};

/// Bookkeeping for a request that has not been fully granted yet
#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    /// Global arrival order; lower is older
    ticket: u64,
    /// When the request was registered
    since: Instant,
    /// Set once the request crosses the starvation threshold
    aged: bool,
}

impl PendingRequest {
    fn is_aged(&self, now: Instant, threshold: Duration) -> bool {
        self.aged || now.saturating_duration_since(self.since) >= threshold
    }
}

/// Age carried across denied non-blocking requests for the same set.
///
/// Honoured only while the caller keeps retrying: a marker whose last
/// denial is older than the starvation threshold reserves nothing.
#[derive(Debug, Clone)]
struct DeniedRequest {
    forks: ForkSet,
    ticket: u64,
    since: Instant,
    aged: bool,
    last_denied: Instant,
}

#[derive(Debug, Clone, Default)]
struct ActorEntry {
    state: ActorState,
    /// Maximum claim (banker "max" vector), fixed by topology
    claim: ForkSet,
    held: ForkSet,
    /// Requested forks not granted yet
    outstanding: ForkSet,
    pending: Option<PendingRequest>,
    denied: Option<DeniedRequest>,
}

impl ActorEntry {
    fn requested(&self) -> ForkSet {
        self.held.iter().chain(self.outstanding.iter()).collect()
    }
}

/// Per-actor view inside a [`LedgerSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorView {
    /// Actor id
    pub id: ActorId,
    /// Lifecycle state at snapshot time
    pub state: ActorState,
    /// Forks held
    pub held: ForkSet,
    /// Forks requested and not yet granted
    pub requested: ForkSet,
    /// How long the pending request has been waiting, if any
    pub waiting_for: Option<Duration>,
}

/// Consistent copy of the ledger taken under a single lock acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Strategy in force
    pub strategy: Strategy,
    /// Holder of each fork, indexed by fork id
    pub holders: Vec<Option<ActorId>>,
    /// Per-actor state, indexed by actor id
    pub actors: Vec<ActorView>,
}

impl LedgerSnapshot {
    /// Actor states in id order
    pub fn states(&self) -> Vec<ActorState> {
        self.actors.iter().map(|a| a.state).collect()
    }
}

/// The ownership table
#[derive(Debug)]
pub struct Ledger {
    strategy: Strategy,
    holders: Vec<Option<ActorId>>,
    actors: Vec<ActorEntry>,
    next_ticket: u64,
}

impl Ledger {
    /// Create a ledger for `num_forks` forks and one actor per claim
    pub fn new(strategy: Strategy, num_forks: usize, claims: Vec<ForkSet>) -> Self {
        let actors = claims
            .into_iter()
            .map(|claim| ActorEntry {
                claim,
                ..ActorEntry::default()
            })
            .collect();

        Self {
            strategy,
            holders: vec![None; num_forks],
            actors,
            next_ticket: 0,
        }
    }

    /// Strategy this ledger grants under
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of actors
    pub fn num_actors(&self) -> usize {
        self.actors.len()
    }

    /// Number of forks
    pub fn num_forks(&self) -> usize {
        self.holders.len()
    }

    /// Current holder of a fork
    pub fn holder(&self, fork: ForkId) -> Option<ActorId> {
        self.holders.get(fork.as_usize()).copied().flatten()
    }

    /// Current state of an actor
    pub fn state(&self, actor: ActorId) -> Result<ActorState, ResourceError> {
        Ok(self.entry(actor)?.state)
    }

    /// Outstanding (not yet granted) forks of an actor
    pub fn outstanding(&self, actor: ActorId) -> Result<&ForkSet, ResourceError> {
        Ok(&self.entry(actor)?.outstanding)
    }

    /// True once the actor's request has been granted in full
    pub fn is_satisfied(&self, actor: ActorId) -> Result<bool, ResourceError> {
        let entry = self.entry(actor)?;
        Ok(entry.pending.is_none() && entry.state == ActorState::Eating)
    }

    /// True while the actor has a request registered
    pub fn has_pending(&self, actor: ActorId) -> Result<bool, ResourceError> {
        Ok(self.entry(actor)?.pending.is_some())
    }

    fn entry(&self, actor: ActorId) -> Result<&ActorEntry, ResourceError> {
        self.actors
            .get(actor.as_usize())
            .ok_or(ResourceError::UnknownActor(actor))
    }

    fn entry_mut(&mut self, actor: ActorId) -> Result<&mut ActorEntry, ResourceError> {
        self.actors
            .get_mut(actor.as_usize())
            .ok_or(ResourceError::UnknownActor(actor))
    }

    fn check_forks(&self, forks: &ForkSet) -> Result<(), ResourceError> {
        match forks.iter().find(|f| f.as_usize() >= self.holders.len()) {
            Some(fork) => Err(ResourceError::UnknownFork(fork)),
            None => Ok(()),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Requests
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Register a request for `forks` (Thinking → Hungry).
    ///
    /// Re-registering the identical pending request is a no-op. Registering
    /// the same set as a previously denied request resumes that request's
    /// ticket and age, so a caller retrying `try_acquire` keeps its place.
    /// An empty set is granted on the spot.
    ///
    /// # Errors
    /// - `UnknownActor` / `UnknownFork` for out-of-range ids
    /// - `RequestPending` if a different request is outstanding
    /// - `AlreadyHolding` if the previous grant was never released
    pub fn register(
        &mut self,
        actor: ActorId,
        forks: &ForkSet,
        now: Instant,
    ) -> Result<(), ResourceError> {
        self.check_forks(forks)?;
        let ticket = self.next_ticket;
        let entry = self.entry_mut(actor)?;

        if entry.pending.is_some() {
            let pending = entry.requested();
            if pending == *forks {
                return Ok(());
            }
            return Err(ResourceError::RequestPending { actor, pending });
        }
        if !entry.held.is_empty() {
            return Err(ResourceError::AlreadyHolding {
                actor,
                held: entry.held.clone(),
            });
        }

        let resumed = match entry.denied.take() {
            Some(denied) if denied.forks == *forks => Some(PendingRequest {
                ticket: denied.ticket,
                since: denied.since,
                aged: denied.aged,
            }),
            _ => None,
        };
        let fresh = resumed.is_none();

        entry.outstanding = forks.clone();
        entry.state = ActorState::Hungry;
        entry.pending = Some(resumed.unwrap_or(PendingRequest {
            ticket,
            since: now,
            aged: false,
        }));
        if forks.is_empty() {
            entry.pending = None;
            entry.state = ActorState::Eating;
        }
        if fresh {
            self.next_ticket += 1;
        }
        Ok(())
    }

    /// Mark requests that crossed `threshold` as aged.
    ///
    /// Returns the actors promoted by this call so the caller can log them
    /// once.
    pub fn promote_aged(&mut self, now: Instant, threshold: Duration) -> Vec<ActorId> {
        let mut promoted = Vec::new();
        for (idx, entry) in self.actors.iter_mut().enumerate() {
            if let Some(pending) = entry.pending.as_mut() {
                if !pending.aged && pending.is_aged(now, threshold) {
                    pending.aged = true;
                    promoted.push(ActorId(idx));
                }
            }
        }
        promoted
    }

    /// First actor whose older, aged request reserves any of `forks`.
    ///
    /// Both pending requests and live denied-request markers count. A
    /// request without a ticket (not registered) counts as the newest.
    fn elder_reservation(
        &self,
        actor: ActorId,
        forks: &ForkSet,
        now: Instant,
        threshold: Duration,
    ) -> Option<ActorId> {
        let mine = self
            .actors
            .get(actor.as_usize())
            .and_then(|e| e.pending)
            .map_or(u64::MAX, |p| p.ticket);

        self.actors.iter().enumerate().find_map(|(idx, other)| {
            if idx == actor.as_usize() {
                return None;
            }
            let (ticket, aged, wanted) = match (other.pending, &other.denied) {
                (Some(pending), _) => (
                    pending.ticket,
                    pending.is_aged(now, threshold),
                    &other.outstanding,
                ),
                (None, Some(denied)) => {
                    if now.saturating_duration_since(denied.last_denied) > threshold {
                        return None;
                    }
                    let aged =
                        denied.aged || now.saturating_duration_since(denied.since) >= threshold;
                    (denied.ticket, aged, &denied.forks)
                }
                (None, None) => return None,
            };
            if ticket >= mine || !aged {
                return None;
            }
            self.strategy
                .frontier(wanted)
                .intersects(forks)
                .then_some(ActorId(idx))
        })
    }

    fn complete(&mut self, actor: ActorId) {
        if let Some(entry) = self.actors.get_mut(actor.as_usize()) {
            entry.pending = None;
            entry.denied = None;
            entry.state = ActorState::Eating;
        }
    }

    /// Grant forks one at a time in ascending order, as far as possible.
    ///
    /// Stops at the first fork that is held or reserved by an elder aged
    /// request. Returns `true` once the whole request is granted.
    pub fn grant_in_order(
        &mut self,
        actor: ActorId,
        now: Instant,
        threshold: Duration,
    ) -> Result<bool, ResourceError> {
        loop {
            let entry = self.entry(actor)?;
            if entry.pending.is_none() {
                return Ok(entry.state == ActorState::Eating);
            }
            let Some(next) = entry.outstanding.first() else {
                self.complete(actor);
                return Ok(true);
            };
            if self.holder(next).is_some() {
                return Ok(false);
            }
            let single: ForkSet = std::iter::once(next).collect();
            if self.elder_reservation(actor, &single, now, threshold).is_some() {
                return Ok(false);
            }

            self.holders[next.as_usize()] = Some(actor);
            let entry = self.entry_mut(actor)?;
            entry.outstanding.remove(next);
            entry.held.insert(next);
        }
    }

    /// Grant the whole outstanding set at once, or nothing.
    ///
    /// With `check_safety` the grant additionally has to leave the ledger in
    /// a safe state (see [`Ledger::is_safe_after`]). Returns `true` once the
    /// request is granted.
    pub fn grant_whole(
        &mut self,
        actor: ActorId,
        now: Instant,
        threshold: Duration,
        check_safety: bool,
    ) -> Result<bool, ResourceError> {
        let entry = self.entry(actor)?;
        if entry.pending.is_none() {
            return Ok(entry.state == ActorState::Eating);
        }
        let outstanding = entry.outstanding.clone();

        if outstanding.iter().any(|f| self.holder(f).is_some()) {
            return Ok(false);
        }
        if self
            .elder_reservation(actor, &outstanding, now, threshold)
            .is_some()
        {
            return Ok(false);
        }
        if check_safety && !self.is_safe_after(actor, &outstanding) {
            return Ok(false);
        }

        for fork in outstanding.iter() {
            self.holders[fork.as_usize()] = Some(actor);
        }
        let entry = self.entry_mut(actor)?;
        entry.held = outstanding;
        entry.outstanding.clear();
        self.complete(actor);
        Ok(true)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Safety algorithm
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// True if the current ledger state is safe
    pub fn is_safe(&self) -> bool {
        self.safety_check(None)
    }

    /// True if granting `grant` to `actor` leaves a safe state.
    ///
    /// Banker's safety algorithm over single-unit resources: `work` starts as
    /// the free forks, then repeatedly any actor whose remaining need fits in
    /// `work` is assumed to finish and return its allocation. The state is
    /// safe iff every actor can finish.
    pub fn is_safe_after(&self, actor: ActorId, grant: &ForkSet) -> bool {
        self.safety_check(Some((actor, grant)))
    }

    fn safety_check(&self, grant: Option<(ActorId, &ForkSet)>) -> bool {
        let mut work: Vec<bool> = self.holders.iter().map(Option::is_none).collect();
        let mut allocation: Vec<ForkSet> = self.actors.iter().map(|e| e.held.clone()).collect();

        if let Some((actor, forks)) = grant {
            let Some(alloc) = allocation.get_mut(actor.as_usize()) else {
                return false;
            };
            for fork in forks.iter() {
                if let Some(slot) = work.get_mut(fork.as_usize()) {
                    *slot = false;
                }
                alloc.insert(fork);
            }
        }

        let need: Vec<ForkSet> = self
            .actors
            .iter()
            .zip(&allocation)
            .map(|(entry, alloc)| {
                let max: ForkSet = entry
                    .claim
                    .iter()
                    .chain(entry.held.iter())
                    .chain(entry.outstanding.iter())
                    .collect();
                max.difference(alloc)
            })
            .collect();

        let mut finished = vec![false; self.actors.len()];
        loop {
            let mut progressed = false;
            for idx in 0..self.actors.len() {
                if finished[idx] {
                    continue;
                }
                let fits = need[idx]
                    .iter()
                    .all(|f| work.get(f.as_usize()).copied().unwrap_or(false));
                if fits {
                    for fork in allocation[idx].iter() {
                        work[fork.as_usize()] = true;
                    }
                    finished[idx] = true;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        finished.into_iter().all(|done| done)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Release
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Return a granted set (Eating → Thinking).
    ///
    /// # Errors
    /// - `RequestPending` if the actor is still waiting on a request
    /// - `OwnershipMismatch` unless `forks` equals exactly what is held
    pub fn release(&mut self, actor: ActorId, forks: &ForkSet) -> Result<(), ResourceError> {
        self.check_forks(forks)?;
        let entry = self.entry(actor)?;
        if entry.pending.is_some() {
            return Err(ResourceError::RequestPending {
                actor,
                pending: entry.requested(),
            });
        }
        if entry.held != *forks {
            return Err(ResourceError::OwnershipMismatch {
                actor,
                released: forks.clone(),
                held: entry.held.clone(),
            });
        }

        for fork in forks.iter() {
            self.holders[fork.as_usize()] = None;
        }
        let entry = self.entry_mut(actor)?;
        entry.held.clear();
        entry.state = ActorState::Thinking;
        Ok(())
    }

    /// Drop a pending request that was refused, remembering its ticket and
    /// age so the next registration of the same set resumes them.
    ///
    /// Returns any forks the request had partially acquired.
    pub fn deny(&mut self, actor: ActorId, now: Instant) -> Result<ForkSet, ResourceError> {
        let entry = self.entry(actor)?;
        let Some(pending) = entry.pending else {
            return Ok(ForkSet::new());
        };
        let marker = DeniedRequest {
            forks: entry.requested(),
            ticket: pending.ticket,
            since: pending.since,
            aged: pending.aged,
            last_denied: now,
        };

        let freed = self.abandon(actor)?;
        self.entry_mut(actor)?.denied = Some(marker);
        Ok(freed)
    }

    /// Drop a pending request, returning any forks it had partially acquired.
    ///
    /// No-op (empty set) if nothing is pending.
    pub fn withdraw(&mut self, actor: ActorId) -> Result<ForkSet, ResourceError> {
        if self.entry(actor)?.pending.is_none() {
            return Ok(ForkSet::new());
        }
        self.abandon(actor)
    }

    /// Forget everything about an actor: pending request and held forks.
    ///
    /// Returns the forks that became free.
    pub fn abandon(&mut self, actor: ActorId) -> Result<ForkSet, ResourceError> {
        let entry = self.entry_mut(actor)?;
        let freed = std::mem::take(&mut entry.held);
        entry.outstanding.clear();
        entry.pending = None;
        entry.denied = None;
        entry.state = ActorState::Thinking;

        for fork in freed.iter() {
            self.holders[fork.as_usize()] = None;
        }
        Ok(freed)
    }

    /// Consistent copy of the whole table
    pub fn snapshot(&self, now: Instant) -> LedgerSnapshot {
        LedgerSnapshot {
            strategy: self.strategy,
            holders: self.holders.clone(),
            actors: self
                .actors
                .iter()
                .enumerate()
                .map(|(idx, entry)| ActorView {
                    id: ActorId(idx),
                    state: entry.state,
                    held: entry.held.clone(),
                    requested: entry.outstanding.clone(),
                    waiting_for: entry
                        .pending
                        .map(|p| p.since)
                        .or_else(|| entry.denied.as_ref().map(|d| d.since))
                        .map(|since| now.saturating_duration_since(since)),
                })
                .collect(),
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        for (fork, holder) in self.holders.iter().enumerate() {
            if let Some(actor) = holder {
                assert!(self.actors[actor.as_usize()].held.contains(ForkId(fork)));
            }
        }
        for (idx, entry) in self.actors.iter().enumerate() {
            assert!(!entry.held.intersects(&entry.outstanding));
            assert!(entry.pending.is_none() || entry.denied.is_none());
            for fork in entry.held.iter() {
                assert_eq!(self.holders[fork.as_usize()], Some(ActorId(idx)));
            }
            match entry.state {
                ActorState::Hungry => assert!(entry.pending.is_some()),
                ActorState::Eating => assert!(entry.pending.is_none()),
                ActorState::Thinking => {
                    assert!(entry.pending.is_none());
                    assert!(entry.held.is_empty());
                }
            }
        }
    }
}
