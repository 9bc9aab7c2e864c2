//! Minimal add/remove planning between persisted and desired districts.
//!
//! # Responsibility
//! - Compute per-collection set differences between two district states.
//! - Flatten a plan into the ordered operation list the executor runs.
//!
//! # Invariants
//! - Values present on both sides never generate an operation.
//! - Values are compared by their trimmed form; blank values never produce
//!   an operation.
//! - Adds carry the trimmed value; removes carry the persisted value exactly
//!   as the backend stores it.
//! - Applying `to_add`/`to_remove` to the persisted sets yields the desired
//!   values once trimmed.
//! - Planning is pure and never fails.

use crate::model::district::{
    normalize_child_value, normalize_child_values, ChildKind, District,
};
use crate::model::operation::{ChildChange, DistrictRef, Operation};
use indexmap::IndexSet;

/// Minimal change set for one district.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub panchayaths_to_add: IndexSet<String>,
    pub panchayaths_to_remove: IndexSet<String>,
    pub pincodes_to_add: IndexSet<String>,
    pub pincodes_to_remove: IndexSet<String>,
    /// Informational only; the backend has no rename endpoint.
    pub name_changed: bool,
}

impl ReconciliationPlan {
    /// True when no remote operation is needed. A name change alone does not
    /// count.
    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    pub fn operation_count(&self) -> usize {
        self.panchayaths_to_add.len()
            + self.panchayaths_to_remove.len()
            + self.pincodes_to_add.len()
            + self.pincodes_to_remove.len()
    }

    pub fn to_add(&self, kind: ChildKind) -> &IndexSet<String> {
        match kind {
            ChildKind::Panchayath => &self.panchayaths_to_add,
            ChildKind::Pincode => &self.pincodes_to_add,
        }
    }

    pub fn to_remove(&self, kind: ChildKind) -> &IndexSet<String> {
        match kind {
            ChildKind::Panchayath => &self.panchayaths_to_remove,
            ChildKind::Pincode => &self.pincodes_to_remove,
        }
    }

    /// Flattens the plan into executor order: panchayath adds, pincode adds,
    /// panchayath removes, pincode removes.
    pub fn operations(&self, target: &DistrictRef) -> Vec<Operation> {
        let adds = [ChildKind::Panchayath, ChildKind::Pincode]
            .into_iter()
            .flat_map(|kind| {
                self.to_add(kind)
                    .iter()
                    .map(move |value| ChildChange::add(kind, value.clone()))
            });
        let removes = [ChildKind::Panchayath, ChildKind::Pincode]
            .into_iter()
            .flat_map(|kind| {
                self.to_remove(kind)
                    .iter()
                    .map(move |value| ChildChange::remove(kind, value.clone()))
            });

        adds.chain(removes)
            .map(|change| Operation::new(target.clone(), change))
            .collect()
    }
}

/// Computes the minimal plan that turns `persisted` into `desired`.
pub fn compute_plan(persisted: &District, desired: &District) -> ReconciliationPlan {
    let (panchayaths_to_add, panchayaths_to_remove) =
        diff_collection(&persisted.panchayaths, &desired.panchayaths);
    let (pincodes_to_add, pincodes_to_remove) =
        diff_collection(&persisted.pincodes, &desired.pincodes);

    ReconciliationPlan {
        panchayaths_to_add,
        panchayaths_to_remove,
        pincodes_to_add,
        pincodes_to_remove,
        name_changed: persisted.display_name().trim() != desired.display_name().trim(),
    }
}

/// Plans the creation of a brand-new district against an empty baseline.
pub fn compute_creation_plan(desired: &District) -> ReconciliationPlan {
    compute_plan(&District::new(desired.name.clone()), desired)
}

fn diff_collection(
    persisted: &IndexSet<String>,
    desired: &IndexSet<String>,
) -> (IndexSet<String>, IndexSet<String>) {
    let persisted_keys = normalize_child_values(persisted);
    let desired_keys = normalize_child_values(desired);

    let to_add = desired_keys.difference(&persisted_keys).cloned().collect();
    let to_remove = persisted
        .iter()
        .filter(|value| {
            normalize_child_value(value).is_some_and(|key| !desired_keys.contains(&key))
        })
        .cloned()
        .collect();
    (to_add, to_remove)
}
