//! Infrastructure Layer - Threads, Time & Randomness
//!
//! Concrete plumbing the domain does not want to know about.
//!
//! # Responsibilities
//! - Cooperative shutdown with interruptible sleeps
//! - Seeded or entropy-backed interval generation

pub mod pacing;
pub mod shutdown;

// Re-exports
pub use pacing::Pacer;
pub use shutdown::Shutdown;
