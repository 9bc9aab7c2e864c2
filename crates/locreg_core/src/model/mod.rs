//! Location registry domain model.
//!
//! # Responsibility
//! - Define the District record, its child collections and edit drafts.
//! - Define the atomic operations the backend understands.
//!
//! # Invariants
//! - Child values are unique per collection within one district.
//! - Blank values never enter a `District`.

pub mod district;
pub mod draft;
pub mod operation;
pub mod validation;
