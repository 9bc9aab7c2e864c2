//! In-memory location registry.
//!
//! # Responsibility
//! - Hold the canonical in-memory list of districts in server listing order.
//! - Provide lookup by backend id and by grouping name.
//!
//! # Invariants
//! - No remote I/O happens here.
//! - Listing order only changes on explicit `load` or on insert/remove.
//! - Mutation entry points are crate-private; callers outside the crate can
//!   only read.

use crate::model::district::{District, DistrictId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DistrictNotFound(DistrictId),
    /// `replace` was asked to change a record's id.
    IdMismatch {
        expected: DistrictId,
        actual: Option<DistrictId>,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DistrictNotFound(id) => write!(f, "district not found: {id}"),
            Self::IdMismatch { expected, actual } => write!(
                f,
                "district id is immutable: expected `{expected}`, got `{}`",
                actual.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

impl Error for RegistryError {}

/// Ordered in-memory district store.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    districts: Vec<District>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets one district by backend id.
    pub fn get(&self, id: &str) -> Option<&District> {
        self.districts
            .iter()
            .find(|district| district.id.as_deref() == Some(id))
    }

    /// Finds one district by backend grouping name.
    pub fn find_by_name(&self, name: &str) -> Option<&District> {
        let name = name.trim();
        self.districts
            .iter()
            .find(|district| district.name.trim() == name)
    }

    /// Lists districts in server listing order.
    pub fn list(&self) -> &[District] {
        &self.districts
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Replaces the full contents with a fresh server listing.
    pub(crate) fn load(&mut self, listing: Vec<District>) {
        self.districts = listing;
    }

    /// Swaps one record in place, keeping its listing position.
    ///
    /// # Errors
    /// - `DistrictNotFound` when no record has `id`.
    /// - `IdMismatch` when `district.id` differs from `id`.
    pub(crate) fn replace(&mut self, id: &str, district: District) -> RegistryResult<()> {
        if district.id.as_deref() != Some(id) {
            return Err(RegistryError::IdMismatch {
                expected: id.to_string(),
                actual: district.id,
            });
        }
        let slot = self
            .districts
            .iter_mut()
            .find(|existing| existing.id.as_deref() == Some(id))
            .ok_or_else(|| RegistryError::DistrictNotFound(id.to_string()))?;
        *slot = district;
        Ok(())
    }

    /// Appends a newly created district at the end of the listing.
    pub(crate) fn insert(&mut self, district: District) {
        self.districts.push(district);
    }

    /// Returns a mutable handle to the record with the given name.
    pub(crate) fn find_by_name_mut(&mut self, name: &str) -> Option<&mut District> {
        let name = name.trim();
        self.districts
            .iter_mut()
            .find(|district| district.name.trim() == name)
    }

    /// Removes one district by id and returns it.
    pub(crate) fn remove(&mut self, id: &str) -> RegistryResult<District> {
        let index = self
            .districts
            .iter()
            .position(|district| district.id.as_deref() == Some(id))
            .ok_or_else(|| RegistryError::DistrictNotFound(id.to_string()))?;
        Ok(self.districts.remove(index))
    }
}
