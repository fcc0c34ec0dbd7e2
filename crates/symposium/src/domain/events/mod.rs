//! Event Telemetry
//!
//! Actors publish [`Event`]s into a bounded [`EventBus`]; a single consumer
//! polls them out in sequence order.

pub mod bus;
pub mod event;

pub use bus::{EventBus, DEFAULT_EVENT_CAPACITY};
pub use event::{Event, EventKind};
