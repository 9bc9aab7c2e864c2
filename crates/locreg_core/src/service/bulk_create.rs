//! First-time district creation through per-value add calls.
//!
//! # Responsibility
//! - Validate a new-district submission.
//! - Decompose it into one add operation per panchayath and per pincode.
//!
//! # Invariants
//! - Submissions without any child value are rejected before any call.
//! - When the backend already holds a district with the same name, values it
//!   already stores are rejected; the backend keeps duplicates verbatim.
//! - The operation list diffs against an empty baseline, so it only adds.
//! - All operations are bound to the new district's name and carry no id.

use crate::model::district::{normalize_child_values, ChildKind, District};
use crate::model::draft::DistrictDraft;
use crate::model::operation::{DistrictRef, Operation};
use crate::model::validation::{ChildValueValidator, DistrictValidationError};
use crate::service::diff_engine::compute_creation_plan;

/// Validated creation request ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationBatch {
    /// Desired state of the new district (no id yet).
    pub district: District,
    /// One add per child value: panchayaths first, then pincodes.
    pub operations: Vec<Operation>,
}

/// Builds the creation batch for `draft`.
///
/// `existing` is the registry record carrying the same backend name, if any.
///
/// # Errors
/// - Any draft rule violation (`EmptyName`, `NoChildValues`,
///   `DuplicateValue`).
/// - `DuplicateValue` for a value `existing` already holds.
/// - `InvalidFormat` from `validator` for any child value.
pub fn plan_creation(
    draft: &DistrictDraft,
    existing: Option<&District>,
    validator: &dyn ChildValueValidator,
) -> Result<CreationBatch, DistrictValidationError> {
    draft.validate_for_create()?;
    let district = draft.into_desired(None)?;

    for kind in [ChildKind::Panchayath, ChildKind::Pincode] {
        let stored = existing
            .map(|record| normalize_child_values(record.children(kind)))
            .unwrap_or_default();
        for value in district.children(kind) {
            if stored.contains(value) {
                return Err(DistrictValidationError::DuplicateValue {
                    kind,
                    value: value.clone(),
                });
            }
            validator.check(kind, value)?;
        }
    }

    let target = DistrictRef::new(None, district.name.clone());
    let operations = compute_creation_plan(&district).operations(&target);
    Ok(CreationBatch {
        district,
        operations,
    })
}
