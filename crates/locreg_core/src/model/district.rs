//! District domain model.
//!
//! # Responsibility
//! - Define the canonical District record and its two child collections.
//! - Decode/encode the admin API wire shape for district records.
//!
//! # Invariants
//! - Child values are never blank once inside a `District`.
//! - Values decoded from the backend keep their exact spelling so removals
//!   address the stored value; locally built values are trimmed.
//! - Child collections are sets: a value appears at most once per collection.
//! - `id` is assigned by the backend and never changed after assignment.
//! - `name` is the backend grouping key; a local-only rename lives in
//!   `unpersisted_name` and never replaces `name`.

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque backend identifier for one district record.
pub type DistrictId = String;

/// Which child collection a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    /// Named sub-location value.
    Panchayath,
    /// Postal-code value.
    Pincode,
}

impl ChildKind {
    /// Stable string id used in logs and error codes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panchayath => "panchayath",
            Self::Pincode => "pincode",
        }
    }
}

/// Canonical district record.
///
/// Serialized with the admin API field names (`_id`, `District`,
/// `Panchayaths`, `PinCodes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    /// Absent until the backend accepted the first write for this district.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DistrictId>,
    /// Backend grouping key. Children are added under this name.
    #[serde(rename = "District")]
    pub name: String,
    #[serde(
        rename = "Panchayaths",
        default,
        deserialize_with = "deserialize_child_values"
    )]
    pub panchayaths: IndexSet<String>,
    #[serde(
        rename = "PinCodes",
        default,
        deserialize_with = "deserialize_child_values"
    )]
    pub pincodes: IndexSet<String>,
    /// Display-only rename the backend could not persist.
    #[serde(skip)]
    pub unpersisted_name: Option<String>,
}

impl District {
    /// Creates a district that has not been written to the backend yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            panchayaths: IndexSet::new(),
            pincodes: IndexSet::new(),
            unpersisted_name: None,
        }
    }

    /// Creates a district with a backend-assigned id.
    pub fn with_id(id: impl Into<DistrictId>, name: impl Into<String>) -> Self {
        let mut district = Self::new(name);
        district.id = Some(id.into());
        district
    }

    /// Replaces the panchayath set, trimming values and dropping blanks.
    pub fn with_panchayaths<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.panchayaths = normalize_child_values(values);
        self
    }

    /// Replaces the pincode set, trimming values and dropping blanks.
    pub fn with_pincodes<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pincodes = normalize_child_values(values);
        self
    }

    /// Name shown to users: the local rename when one exists, else `name`.
    pub fn display_name(&self) -> &str {
        self.unpersisted_name.as_deref().unwrap_or(self.name.as_str())
    }

    /// Whether the displayed name differs from what the backend holds.
    pub fn has_unpersisted_name(&self) -> bool {
        self.unpersisted_name.is_some()
    }

    /// Returns one child collection.
    pub fn children(&self, kind: ChildKind) -> &IndexSet<String> {
        match kind {
            ChildKind::Panchayath => &self.panchayaths,
            ChildKind::Pincode => &self.pincodes,
        }
    }

    pub(crate) fn children_mut(&mut self, kind: ChildKind) -> &mut IndexSet<String> {
        match kind {
            ChildKind::Panchayath => &mut self.panchayaths,
            ChildKind::Pincode => &mut self.pincodes,
        }
    }

    /// Whether both child collections are empty.
    pub fn has_no_children(&self) -> bool {
        self.panchayaths.is_empty() && self.pincodes.is_empty()
    }

    /// Total number of child values across both collections.
    pub fn child_count(&self) -> usize {
        self.panchayaths.len() + self.pincodes.len()
    }
}

/// Trims values, drops blank ones and removes duplicates, keeping first-seen
/// order.
pub fn normalize_child_values<I, S>(values: I) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter_map(|value| normalize_child_value(value.as_ref()))
        .collect()
}

/// Returns the trimmed value, or `None` for blank input.
pub fn normalize_child_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Drops blank entries and exact repeats but keeps each value as stored.
pub fn stored_child_values<I, S>(values: I) -> IndexSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .filter(|value| !value.as_ref().trim().is_empty())
        .map(|value| value.as_ref().to_string())
        .collect()
}

// The listing endpoint may send `null` or omit child arrays entirely.
fn deserialize_child_values<'de, D>(deserializer: D) -> Result<IndexSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(stored_child_values(values.unwrap_or_default()))
}
