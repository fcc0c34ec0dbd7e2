//! Philosopher - One Actor Thread
//!
//! ```text
//!        think (interruptible)
//! Thinking ───────────────────▶ Hungry
//!    ▲                            │ acquire (blocks, cancellable)
//!    │ release                    ▼
//!    └──────────────────────── Eating
//!        eat (interruptible)
//! ```
//!
//! Every transition is published as a STATE event. The thread brackets its
//! life with LIFECYCLE `started` / `stopped`, and whatever it holds on exit
//! is returned to the manager.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use crate::domain::events::{EventBus, EventKind};
use crate::domain::resources::{
    AcquireOutcome, ActorId, ActorState, ForkSet, ResourceError, ResourceManager,
};
use crate::domain::stats::ActorStatistics;
use crate::infrastructure::{Pacer, Shutdown};

/// Everything one actor thread owns or shares
pub struct Philosopher {
    id: ActorId,
    required: ForkSet,
    manager: Arc<ResourceManager>,
    bus: Arc<EventBus>,
    stats: Arc<ActorStatistics>,
    shutdown: Arc<Shutdown>,
    pacer: Pacer,
}

impl Philosopher {
    /// Assemble an actor; nothing runs until [`Philosopher::run`]
    pub fn new(
        id: ActorId,
        required: ForkSet,
        manager: Arc<ResourceManager>,
        bus: Arc<EventBus>,
        stats: Arc<ActorStatistics>,
        shutdown: Arc<Shutdown>,
        pacer: Pacer,
    ) -> Self {
        Self {
            id,
            required,
            manager,
            bus,
            stats,
            shutdown,
            pacer,
        }
    }

    /// Actor id
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Thread body: cycle until shutdown or a fault
    pub fn run(mut self) {
        debug!(actor = %self.id, forks = %self.required, "actor started");
        self.bus.publish(self.id, EventKind::Lifecycle, "started");

        if let Err(err) = self.cycle() {
            error!(actor = %self.id, error = %err, "actor fault, stopping actor");
            self.bus.publish(self.id, EventKind::Error, err.to_string());
        }

        match self.manager.abandon(self.id) {
            Ok(freed) if !freed.is_empty() => {
                debug!(actor = %self.id, forks = %freed, "returned forks on exit");
            }
            Ok(_) => {}
            Err(err) => error!(actor = %self.id, error = %err, "failed to return forks"),
        }

        self.bus.publish(self.id, EventKind::Lifecycle, "stopped");
        debug!(actor = %self.id, "actor stopped");
    }

    fn cycle(&mut self) -> Result<(), ResourceError> {
        loop {
            self.announce(ActorState::Thinking);
            if !self.shutdown.sleep(self.pacer.think()) {
                return Ok(());
            }

            self.announce(ActorState::Hungry);
            let hungry_since = Instant::now();
            match self.manager.acquire(self.id, &self.required, &*self.shutdown)? {
                AcquireOutcome::Acquired => {}
                AcquireOutcome::Cancelled => return Ok(()),
            }
            self.stats.record_meal(self.id, hungry_since.elapsed());

            self.announce(ActorState::Eating);
            let finished = self.shutdown.sleep(self.pacer.eat());
            self.manager.release(self.id, &self.required)?;
            if !finished {
                return Ok(());
            }
        }
    }

    fn announce(&self, state: ActorState) {
        debug!(actor = %self.id, %state, "transition");
        self.bus.publish(self.id, EventKind::State, state.name());
    }
}
