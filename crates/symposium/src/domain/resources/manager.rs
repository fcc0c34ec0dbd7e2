//! ResourceManager - Blocking, Cancellable Fork Allocation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ ResourceManager                             │
//! │   ledger: Mutex<Ledger>        (ownership)  │
//! │   fork_signals: [Condvar; M]   (Ordered)    │
//! │   release_signal: Condvar      (Banker)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every decision is taken under the ledger lock, so fork transfer is atomic
//! and the banker check always sees a consistent table. The lock is never
//! held across a sleep: waiters park on a condvar, which releases it.
//!
//! Ordered waiters park on the condvar of the fork they are blocked on;
//! banker waiters park on the shared release condvar. Every release notifies
//! both. Waits are bounded by the re-check interval so aging promotion and
//! cancellation are observed even without a release.
//!
//! # Lock Granularity
//!
//! One mutex guards the whole ledger under both strategies. Ordered
//! acquisition only ever touches one fork at a time and could run on
//! per-fork locks, but it shares the ledger lock so a snapshot is a single
//! consistent cut of every holder. The banker check needs a global view of
//! the table anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::ledger::{Ledger, LedgerSnapshot};
use super::strategy::Strategy;
use super::types::{ActorId, ActorState, ForkSet, ResourceError};

/// Default bound on a single condvar wait
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Cancellation source checked on every wake of a blocking acquire
pub trait CancelToken {
    /// True once the caller should give up waiting
    fn is_cancelled(&self) -> bool;
}

impl CancelToken for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// Result of a non-blocking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResult {
    /// The whole set was granted
    Granted,
    /// Nothing was granted; the caller may retry
    Denied,
}

/// Result of a blocking request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The whole set is now held
    Acquired,
    /// Cancelled while waiting; any partial holdings were returned
    Cancelled,
}

/// Sole owner of fork ownership for one run
pub struct ResourceManager {
    strategy: Strategy,
    ledger: Mutex<Ledger>,
    fork_signals: Vec<Condvar>,
    release_signal: Condvar,
    starvation_threshold: Duration,
    recheck_interval: Duration,
}

impl ResourceManager {
    /// Create a manager for `num_forks` forks and one actor per entry of
    /// `claims` (each actor's maximum fork set)
    pub fn new(
        strategy: Strategy,
        num_forks: usize,
        claims: Vec<ForkSet>,
        starvation_threshold: Duration,
        recheck_interval: Duration,
    ) -> Self {
        Self {
            strategy,
            ledger: Mutex::new(Ledger::new(strategy, num_forks, claims)),
            fork_signals: (0..num_forks).map(|_| Condvar::new()).collect(),
            release_signal: Condvar::new(),
            starvation_threshold,
            recheck_interval,
        }
    }

    /// Strategy in force for this manager
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Age after which a pending request gains priority
    pub fn starvation_threshold(&self) -> Duration {
        self.starvation_threshold
    }

    /// Try to take the whole set at once without blocking.
    ///
    /// All-or-nothing under both strategies; the banker safety check applies
    /// under [`Strategy::Banker`]. A denied request holds no forks, but the
    /// ledger remembers its ticket and age: a caller that keeps retrying the
    /// same set ages like a blocked waiter and, once past the starvation
    /// threshold, reserves its forks against newer requests. The marker is
    /// cleared on grant or when the caller asks for a different set.
    pub fn try_acquire(
        &self,
        actor: ActorId,
        forks: &ForkSet,
    ) -> Result<RequestResult, ResourceError> {
        let mut ledger = self.ledger.lock();
        let now = Instant::now();
        ledger.register(actor, forks, now)?;
        self.promote_aged(&mut ledger, now);

        let check_safety = self.strategy == Strategy::Banker;
        if ledger.grant_whole(actor, now, self.starvation_threshold, check_safety)? {
            debug!(%actor, %forks, "granted");
            return Ok(RequestResult::Granted);
        }
        let freed = ledger.deny(actor, now)?;
        drop(ledger);
        self.notify_freed(&freed);
        Ok(RequestResult::Denied)
    }

    /// Block until the whole set is held or `cancel` fires.
    ///
    /// This is the actor's only suspension point. On cancellation the
    /// request is withdrawn and any forks taken so far are returned.
    pub fn acquire(
        &self,
        actor: ActorId,
        forks: &ForkSet,
        cancel: &(impl CancelToken + ?Sized),
    ) -> Result<AcquireOutcome, ResourceError> {
        let mut ledger = self.ledger.lock();
        ledger.register(actor, forks, Instant::now())?;

        loop {
            if cancel.is_cancelled() {
                let freed = ledger.withdraw(actor)?;
                drop(ledger);
                self.notify_freed(&freed);
                return Ok(AcquireOutcome::Cancelled);
            }

            let now = Instant::now();
            self.promote_aged(&mut ledger, now);
            let granted = match self.strategy {
                Strategy::Ordered => {
                    ledger.grant_in_order(actor, now, self.starvation_threshold)?
                }
                Strategy::Banker => {
                    ledger.grant_whole(actor, now, self.starvation_threshold, true)?
                }
            };
            if granted {
                debug!(%actor, %forks, "granted");
                return Ok(AcquireOutcome::Acquired);
            }

            let signal = match self.strategy {
                Strategy::Ordered => ledger
                    .outstanding(actor)?
                    .first()
                    .and_then(|fork| self.fork_signals.get(fork.as_usize()))
                    .unwrap_or(&self.release_signal),
                Strategy::Banker => &self.release_signal,
            };
            signal.wait_for(&mut ledger, self.recheck_interval);
        }
    }

    /// Return exactly the held set.
    ///
    /// # Errors
    /// `OwnershipMismatch` if `forks` differs from what `actor` holds; the
    /// ledger is left untouched.
    pub fn release(&self, actor: ActorId, forks: &ForkSet) -> Result<(), ResourceError> {
        self.ledger.lock().release(actor, forks)?;
        debug!(%actor, %forks, "released");
        self.notify_freed(forks);
        Ok(())
    }

    /// Drop the actor's request and return every fork it holds
    pub fn abandon(&self, actor: ActorId) -> Result<ForkSet, ResourceError> {
        let freed = self.ledger.lock().abandon(actor)?;
        if !freed.is_empty() {
            debug!(%actor, forks = %freed, "abandoned");
        }
        self.notify_freed(&freed);
        Ok(freed)
    }

    /// Wake every waiter so it re-checks its cancel token.
    ///
    /// Takes the ledger lock first: a waiter that already checked its token
    /// is then guaranteed to be parked and receives the notification.
    pub fn wake_all(&self) {
        let _ledger = self.ledger.lock();
        for signal in &self.fork_signals {
            signal.notify_all();
        }
        self.release_signal.notify_all();
    }

    /// Consistent copy of the ownership table
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.lock().snapshot(Instant::now())
    }

    /// Actor states in id order
    pub fn states(&self) -> Vec<ActorState> {
        self.snapshot().states()
    }

    /// Whether the current table passes the banker safety check
    pub fn is_safe(&self) -> bool {
        self.ledger.lock().is_safe()
    }

    fn promote_aged(&self, ledger: &mut MutexGuard<'_, Ledger>, now: Instant) {
        for actor in ledger.promote_aged(now, self.starvation_threshold) {
            warn!(
                %actor,
                threshold_ms = self.starvation_threshold.as_millis() as u64,
                "request aged past starvation threshold, reserving its forks"
            );
        }
    }

    fn notify_freed(&self, forks: &ForkSet) {
        if forks.is_empty() {
            return;
        }
        for fork in forks.iter() {
            if let Some(signal) = self.fork_signals.get(fork.as_usize()) {
                signal.notify_all();
            }
        }
        self.release_signal.notify_all();
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("strategy", &self.strategy)
            .field("forks", &self.fork_signals.len())
            .field("starvation_threshold", &self.starvation_threshold)
            .finish_non_exhaustive()
    }
}
