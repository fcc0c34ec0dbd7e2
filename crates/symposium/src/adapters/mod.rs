//! Adapters Layer - Wiring Domain to Threads
//!
//! # Hexagonal Architecture
//! - Inbound: [`Simulation`] is the control and snapshot port
//! - Outbound: [`Philosopher`] drives the domain from an OS thread

pub mod philosopher;
pub mod simulation;

// Re-exports
pub use philosopher::Philosopher;
pub use simulation::Simulation;
