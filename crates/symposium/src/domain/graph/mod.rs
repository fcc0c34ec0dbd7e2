//! Resource-Allocation Graph & Deadlock Detection

pub mod detector;
pub mod rag;

pub use detector::{DeadlockDetector, WaitForGraph};
pub use rag::{EdgeKind, GraphEdge, ResourceGraph};
