//! Atomic child operations bound to one district.
//!
//! # Responsibility
//! - Describe the only mutations the backend supports: add or remove one
//!   child value.
//!
//! # Invariants
//! - Every operation targets exactly one value in exactly one collection.
//! - Additions are addressed by district name, removals by district id.

use crate::model::district::{ChildKind, DistrictId};
use serde::{Deserialize, Serialize};

/// District an operation is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistrictRef {
    /// Required for removals. `None` for districts not yet created.
    pub id: Option<DistrictId>,
    /// Backend grouping name used for additions.
    pub name: String,
}

impl DistrictRef {
    pub fn new(id: Option<DistrictId>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One atomic change to a child collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ChildChange {
    AddPanchayath(String),
    RemovePanchayath(String),
    AddPincode(String),
    RemovePincode(String),
}

impl ChildChange {
    pub fn add(kind: ChildKind, value: impl Into<String>) -> Self {
        match kind {
            ChildKind::Panchayath => Self::AddPanchayath(value.into()),
            ChildKind::Pincode => Self::AddPincode(value.into()),
        }
    }

    pub fn remove(kind: ChildKind, value: impl Into<String>) -> Self {
        match kind {
            ChildKind::Panchayath => Self::RemovePanchayath(value.into()),
            ChildKind::Pincode => Self::RemovePincode(value.into()),
        }
    }

    /// Collection this change touches.
    pub fn kind(&self) -> ChildKind {
        match self {
            Self::AddPanchayath(_) | Self::RemovePanchayath(_) => ChildKind::Panchayath,
            Self::AddPincode(_) | Self::RemovePincode(_) => ChildKind::Pincode,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::AddPanchayath(value)
            | Self::RemovePanchayath(value)
            | Self::AddPincode(value)
            | Self::RemovePincode(value) => value.as_str(),
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Self::AddPanchayath(_) | Self::AddPincode(_))
    }

    /// Stable label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddPanchayath(_) => "add_panchayath",
            Self::RemovePanchayath(_) => "remove_panchayath",
            Self::AddPincode(_) => "add_pincode",
            Self::RemovePincode(_) => "remove_pincode",
        }
    }
}

/// A child change bound to its target district.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub target: DistrictRef,
    pub change: ChildChange,
}

impl Operation {
    pub fn new(target: DistrictRef, change: ChildChange) -> Self {
        Self { target, change }
    }
}
