//! Remote district service contract.
//!
//! # Responsibility
//! - Describe the atomic endpoints the admin backend exposes.
//! - Carry transport and server failures as one error envelope.
//!
//! # Invariants
//! - Implementations perform exactly one round trip per call.
//! - Implementations never retry; retries belong to callers above the
//!   executor.
//! - No batching or transactional semantics are assumed.

use crate::model::district::{District, DistrictId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Error code for network-level failures (connect, timeout, reset).
pub const REMOTE_ERROR_TRANSPORT: &str = "transport";
/// Error code for non-success responses.
pub const REMOTE_ERROR_REJECTED: &str = "rejected";
/// Error code for undecodable response bodies.
pub const REMOTE_ERROR_INVALID_RESPONSE: &str = "invalid_response";
/// Error code for removals bound to a district without backend id.
pub const REMOTE_ERROR_DISTRICT_ID_MISSING: &str = "district_id_missing";
/// Error code for client-side setup failures.
pub const REMOTE_ERROR_CLIENT: &str = "client";

/// Failure envelope for one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Stable machine-readable code, one of the `REMOTE_ERROR_*` constants.
    pub code: &'static str,
    /// Human-readable reason, preferably the backend's own message.
    pub message: String,
    /// HTTP status when the backend answered.
    pub status: Option<u16>,
    /// Whether a later retry could plausibly succeed.
    pub retryable: bool,
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: REMOTE_ERROR_TRANSPORT,
            message: message.into(),
            status: None,
            retryable: true,
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: REMOTE_ERROR_REJECTED,
            message: message.into(),
            status: Some(status),
            retryable: status >= 500 || status == 429,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            code: REMOTE_ERROR_INVALID_RESPONSE,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    pub fn district_id_missing(district_name: &str) -> Self {
        Self {
            code: REMOTE_ERROR_DISTRICT_ID_MISSING,
            message: format!("district `{district_name}` has no backend id yet"),
            status: None,
            retryable: false,
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self {
            code: REMOTE_ERROR_CLIENT,
            message: message.into(),
            status: None,
            retryable: false,
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl Error for RemoteError {}

/// Successful call acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteAck {
    /// Id of the created or updated district when the backend reported one.
    pub district_id: Option<DistrictId>,
}

impl RemoteAck {
    pub fn with_district_id(id: impl Into<DistrictId>) -> Self {
        Self {
            district_id: Some(id.into()),
        }
    }
}

/// Atomic endpoints of the district admin service.
///
/// Additions address districts by name (the backend creates the district on
/// first add); removals address them by id.
pub trait DistrictRemote {
    /// Short identifier used in logs, e.g. `http` or `memory`.
    fn remote_id(&self) -> &str;
    fn add_panchayath(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck>;
    fn add_pincode(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck>;
    fn delete_panchayath(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck>;
    fn delete_pincode(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck>;
    /// Deletes the district and all of its children.
    fn delete_district(&self, district_id: &str) -> RemoteResult<()>;
    /// Lists all districts with full child sets in server order.
    fn list_districts(&self) -> RemoteResult<Vec<District>>;
}

impl<T: DistrictRemote + ?Sized> DistrictRemote for &T {
    fn remote_id(&self) -> &str {
        (**self).remote_id()
    }

    fn add_panchayath(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        (**self).add_panchayath(district_name, value)
    }

    fn add_pincode(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        (**self).add_pincode(district_name, value)
    }

    fn delete_panchayath(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        (**self).delete_panchayath(district_id, value)
    }

    fn delete_pincode(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        (**self).delete_pincode(district_id, value)
    }

    fn delete_district(&self, district_id: &str) -> RemoteResult<()> {
        (**self).delete_district(district_id)
    }

    fn list_districts(&self) -> RemoteResult<Vec<District>> {
        (**self).list_districts()
    }
}
