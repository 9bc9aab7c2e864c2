//! Registry layer for in-memory district state.
//!
//! # Responsibility
//! - Own the canonical in-memory copy of all districts.
//! - Keep write access behind the reconciler path.
//!
//! # Invariants
//! - The registry never performs remote I/O.
//! - Records are only swapped whole; partial in-place edits go through
//!   `replace`.

pub mod registry;
