//! Validation errors and pluggable child-value format checks.
//!
//! # Responsibility
//! - Name every business rule violation caught before a network call.
//! - Provide the seam for external format validation of child values.
//!
//! # Invariants
//! - Validation never performs remote I/O.
//! - The default validator accepts any non-blank value; format rules are
//!   opt-in.

use crate::model::district::ChildKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static PINCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid pincode regex"));

/// Business rule violations for district input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistrictValidationError {
    /// District name is empty or whitespace-only.
    EmptyName,
    /// Creation submitted without any panchayath or pincode.
    NoChildValues,
    /// A child value is empty or whitespace-only.
    BlankValue(ChildKind),
    /// The same value was entered twice in one collection.
    DuplicateValue { kind: ChildKind, value: String },
    /// A child value was rejected by a format validator.
    InvalidFormat { kind: ChildKind, value: String },
}

impl Display for DistrictValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "district name is required"),
            Self::NoChildValues => {
                write!(f, "at least one panchayath or pin code is required")
            }
            Self::BlankValue(kind) => write!(f, "{} value must not be blank", kind.as_str()),
            Self::DuplicateValue { kind, value } => {
                write!(f, "duplicate {} value: `{value}`", kind.as_str())
            }
            Self::InvalidFormat { kind, value } => {
                write!(f, "invalid {} format: `{value}`", kind.as_str())
            }
        }
    }
}

impl Error for DistrictValidationError {}

/// External format check applied to child values before they are added.
pub trait ChildValueValidator {
    fn check(&self, kind: ChildKind, value: &str) -> Result<(), DistrictValidationError>;
}

/// Accepts every value. Blank/duplicate checks still apply elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ChildValueValidator for AcceptAll {
    fn check(&self, _kind: ChildKind, _value: &str) -> Result<(), DistrictValidationError> {
        Ok(())
    }
}

/// Requires pincodes to be exactly six ASCII digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PincodeFormatValidator;

impl ChildValueValidator for PincodeFormatValidator {
    fn check(&self, kind: ChildKind, value: &str) -> Result<(), DistrictValidationError> {
        if kind == ChildKind::Pincode && !is_valid_pincode(value) {
            return Err(DistrictValidationError::InvalidFormat {
                kind,
                value: value.to_string(),
            });
        }
        Ok(())
    }
}

/// Returns whether `value` is a six-digit postal code.
pub fn is_valid_pincode(value: &str) -> bool {
    PINCODE_RE.is_match(value)
}
