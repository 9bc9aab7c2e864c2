//! Use-case services over the location registry.
//!
//! # Responsibility
//! - Plan minimal remote changes for district edits and creations.
//! - Fold execution results back into local state.
//! - Expose one facade per remote for callers outside the crate.

pub mod bulk_create;
pub mod diff_engine;
pub mod district_service;
pub mod reconciler;
