//! Editable district input (create form and edit session).
//!
//! # Responsibility
//! - Hold raw user input for one district while it is being edited.
//! - Enforce trim/blank/duplicate rules when values are entered.
//! - Validate the whole draft before it is turned into a desired `District`.
//!
//! # Invariants
//! - Values pushed through `push_*` are trimmed and unique per collection.
//! - `into_desired`/`validate_for_create` reject duplicates that were written
//!   into the public vectors directly.

use crate::model::district::{normalize_child_values, ChildKind, District, DistrictId};
use crate::model::validation::DistrictValidationError;
use indexmap::IndexSet;

/// Raw district input owned by the caller until submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictDraft {
    pub name: String,
    pub panchayaths: Vec<String>,
    pub pincodes: Vec<String>,
}

impl DistrictDraft {
    /// Starts an empty draft for a new district.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panchayaths: Vec::new(),
            pincodes: Vec::new(),
        }
    }

    /// Starts an edit session from a persisted record.
    ///
    /// Stored values that differ only by surrounding whitespace show up once.
    pub fn from_district(district: &District) -> Self {
        Self {
            name: district.display_name().to_string(),
            panchayaths: normalize_child_values(&district.panchayaths)
                .into_iter()
                .collect(),
            pincodes: normalize_child_values(&district.pincodes)
                .into_iter()
                .collect(),
        }
    }

    /// Adds one panchayath, rejecting blank and duplicate input.
    pub fn push_panchayath(&mut self, value: &str) -> Result<(), DistrictValidationError> {
        self.push(ChildKind::Panchayath, value)
    }

    /// Adds one pincode, rejecting blank and duplicate input.
    pub fn push_pincode(&mut self, value: &str) -> Result<(), DistrictValidationError> {
        self.push(ChildKind::Pincode, value)
    }

    /// Removes one panchayath. Returns whether it was present.
    pub fn remove_panchayath(&mut self, value: &str) -> bool {
        remove_value(&mut self.panchayaths, value)
    }

    /// Removes one pincode. Returns whether it was present.
    pub fn remove_pincode(&mut self, value: &str) -> bool {
        remove_value(&mut self.pincodes, value)
    }

    fn push(&mut self, kind: ChildKind, value: &str) -> Result<(), DistrictValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DistrictValidationError::BlankValue(kind));
        }
        let values = match kind {
            ChildKind::Panchayath => &mut self.panchayaths,
            ChildKind::Pincode => &mut self.pincodes,
        };
        if values.iter().any(|existing| existing.trim() == trimmed) {
            return Err(DistrictValidationError::DuplicateValue {
                kind,
                value: trimmed.to_string(),
            });
        }
        values.push(trimmed.to_string());
        Ok(())
    }

    /// Validates a first-time creation submission.
    ///
    /// # Errors
    /// - `EmptyName` when the name is blank.
    /// - `DuplicateValue` when one collection repeats a value after trimming.
    /// - `NoChildValues` when both collections are empty after dropping blanks.
    pub fn validate_for_create(&self) -> Result<(), DistrictValidationError> {
        let (panchayaths, pincodes) = self.normalized_children()?;
        if panchayaths.is_empty() && pincodes.is_empty() {
            return Err(DistrictValidationError::NoChildValues);
        }
        Ok(())
    }

    /// Converts an edit draft into the desired state of district `id`.
    ///
    /// Empty child collections are allowed here; only creation requires at
    /// least one value.
    pub fn into_desired(
        &self,
        id: Option<DistrictId>,
    ) -> Result<District, DistrictValidationError> {
        let (panchayaths, pincodes) = self.normalized_children()?;
        let mut district = District::new(self.name.trim());
        district.id = id;
        district.panchayaths = panchayaths;
        district.pincodes = pincodes;
        Ok(district)
    }

    fn normalized_children(
        &self,
    ) -> Result<(IndexSet<String>, IndexSet<String>), DistrictValidationError> {
        if self.name.trim().is_empty() {
            return Err(DistrictValidationError::EmptyName);
        }
        let panchayaths = unique_values(ChildKind::Panchayath, &self.panchayaths)?;
        let pincodes = unique_values(ChildKind::Pincode, &self.pincodes)?;
        Ok((panchayaths, pincodes))
    }
}

fn unique_values(
    kind: ChildKind,
    values: &[String],
) -> Result<IndexSet<String>, DistrictValidationError> {
    let mut unique = IndexSet::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !unique.insert(trimmed.to_string()) {
            return Err(DistrictValidationError::DuplicateValue {
                kind,
                value: trimmed.to_string(),
            });
        }
    }
    Ok(unique)
}

fn remove_value(values: &mut Vec<String>, value: &str) -> bool {
    let before = values.len();
    values.retain(|existing| existing.trim() != value.trim());
    values.len() != before
}
