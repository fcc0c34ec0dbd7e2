//! Fork Ownership & Allocation
//!
//! # Architecture
//!
//! - [`Ledger`]: plain ownership table plus the banker safety algorithm.
//!   No locking, fully unit-testable.
//! - [`ResourceManager`]: wraps the ledger in a mutex and adds blocking,
//!   cancellable acquisition on top of condvars.
//! - [`Strategy`]: closed set of allocation policies, fixed per run.
//!
//! ## Ownership Rules
//!
//! ```text
//! register   Thinking -> Hungry     (request recorded, ticket assigned)
//! grant      Hungry   -> Eating     (whole set held, atomically visible)
//! release    Eating   -> Thinking   (exactly the held set)
//! withdraw   Hungry   -> Thinking   (cancelled; partial forks returned)
//! deny       Hungry   -> Thinking   (try_acquire refused; ticket and age kept)
//! ```

pub mod ledger;
pub mod manager;
pub mod strategy;
pub mod types;

// Re-exports
pub use ledger::{ActorView, Ledger, LedgerSnapshot};
pub use manager::{
    AcquireOutcome, CancelToken, RequestResult, ResourceManager, DEFAULT_RECHECK_INTERVAL,
};
pub use strategy::Strategy;
pub use types::*;
