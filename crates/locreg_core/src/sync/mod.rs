//! Remote synchronization for district child values.
//!
//! # Responsibility
//! - Define the remote district service contract and its implementations.
//! - Execute atomic operation lists and report per-operation outcomes.
//!
//! # Invariants
//! - Transport faults are converted into per-operation failures here and
//!   never reach the reconciler as errors.

pub mod executor;
pub mod http_remote;
pub mod memory_remote;
pub mod remote;
