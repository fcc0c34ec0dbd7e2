//! Shutdown Signal
//!
//! One-shot flag shared by every actor of a run. Sleeping through
//! [`Shutdown::sleep`] returns as soon as the flag is raised, so `stop()`
//! never waits out a full think or eat interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::domain::resources::CancelToken;

/// Cancellable stop flag with interruptible sleeps
#[derive(Debug, Default)]
pub struct Shutdown {
    triggered: AtomicBool,
    lock: Mutex<()>,
    signal: Condvar,
}

impl Shutdown {
    /// New, untriggered signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every sleeper. Idempotent.
    pub fn trigger(&self) {
        let _guard = self.lock.lock();
        self.triggered.store(true, Ordering::Release);
        self.signal.notify_all();
    }

    /// True once [`Shutdown::trigger`] was called
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Sleep for `duration` unless triggered first.
    ///
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.lock.lock();
        while !self.is_triggered() {
            if self.signal.wait_until(&mut guard, deadline).timed_out() {
                return !self.is_triggered();
            }
        }
        false
    }
}

impl CancelToken for Shutdown {
    fn is_cancelled(&self) -> bool {
        self.is_triggered()
    }
}
