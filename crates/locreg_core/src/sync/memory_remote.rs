//! In-process district backend with failure injection.
//!
//! # Responsibility
//! - Mirror the admin backend's per-value endpoint semantics in memory.
//! - Let callers simulate per-value failures and full network outages.
//! - Record every call that reached the backend.
//!
//! # Invariants
//! - Like the real backend, additions are addressed by district name and
//!   create the district on first add.
//! - Like the real backend, no deduplication happens on add; callers must
//!   not send duplicates.
//! - Calls that fail because of injected faults are still recorded.

use crate::model::district::{
    normalize_child_values, stored_child_values, District, DistrictId,
};
use crate::sync::remote::{DistrictRemote, RemoteAck, RemoteError, RemoteResult};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// One call observed by the in-memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    AddPanchayath { district: String, value: String },
    AddPincode { district: String, value: String },
    DeletePanchayath { district_id: String, value: String },
    DeletePincode { district_id: String, value: String },
    DeleteDistrict { district_id: String },
    List,
}

#[derive(Debug, Clone)]
struct StoredDistrict {
    id: DistrictId,
    name: String,
    // Vec, not a set: the backend keeps whatever it is sent.
    panchayaths: Vec<String>,
    pincodes: Vec<String>,
}

impl StoredDistrict {
    fn to_district(&self) -> District {
        let mut district = District::with_id(self.id.clone(), self.name.clone());
        district.panchayaths = stored_child_values(&self.panchayaths);
        district.pincodes = stored_child_values(&self.pincodes);
        district
    }
}

#[derive(Debug, Default)]
struct BackendState {
    districts: Vec<StoredDistrict>,
    next_id: u64,
    failing_values: BTreeSet<String>,
    offline: bool,
    calls: Vec<RemoteCall>,
}

impl BackendState {
    fn allocate_id(&mut self) -> DistrictId {
        self.next_id += 1;
        format!("mem-{:04}", self.next_id)
    }

    fn check_reachable(&self, value: Option<&str>) -> RemoteResult<()> {
        if self.offline {
            return Err(RemoteError::transport("backend unreachable"));
        }
        if let Some(value) = value {
            if self.failing_values.contains(value) {
                return Err(RemoteError::rejected(500, format!("injected failure for `{value}`")));
            }
        }
        Ok(())
    }

    fn add(&mut self, district_name: &str, value: &str, pincode: bool) -> RemoteResult<RemoteAck> {
        self.check_reachable(Some(value))?;
        if district_name.trim().is_empty() || value.trim().is_empty() {
            return Err(RemoteError::rejected(400, "District and value are required"));
        }

        let index = match self
            .districts
            .iter()
            .position(|district| district.name == district_name)
        {
            Some(index) => index,
            None => {
                let id = self.allocate_id();
                self.districts.push(StoredDistrict {
                    id,
                    name: district_name.to_string(),
                    panchayaths: Vec::new(),
                    pincodes: Vec::new(),
                });
                self.districts.len() - 1
            }
        };

        let district = &mut self.districts[index];
        if pincode {
            district.pincodes.push(value.to_string());
        } else {
            district.panchayaths.push(value.to_string());
        }
        Ok(RemoteAck::with_district_id(district.id.clone()))
    }

    fn delete(&mut self, district_id: &str, value: &str, pincode: bool) -> RemoteResult<RemoteAck> {
        self.check_reachable(Some(value))?;
        let district = self
            .districts
            .iter_mut()
            .find(|district| district.id == district_id)
            .ok_or_else(|| RemoteError::rejected(404, "District not found"))?;

        let values = if pincode {
            &mut district.pincodes
        } else {
            &mut district.panchayaths
        };
        let before = values.len();
        values.retain(|existing| existing != value);
        if values.len() == before {
            return Err(RemoteError::rejected(404, format!("`{value}` not found")));
        }
        Ok(RemoteAck::with_district_id(district.id.clone()))
    }
}

/// Thread-safe in-memory stand-in for the admin backend.
#[derive(Debug, Default)]
pub struct InMemoryDistrictRemote {
    state: Mutex<BackendState>,
}

impl InMemoryDistrictRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one district directly, bypassing call recording.
    ///
    /// Returns the assigned id.
    pub fn seed<P, Q, S, T>(&self, name: &str, panchayaths: P, pincodes: Q) -> DistrictId
    where
        P: IntoIterator<Item = S>,
        Q: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.districts.push(StoredDistrict {
            id: id.clone(),
            name: name.to_string(),
            panchayaths: normalize_child_values(panchayaths).into_iter().collect(),
            pincodes: normalize_child_values(pincodes).into_iter().collect(),
        });
        id
    }

    /// Makes every add/delete call carrying `value` fail with a server error.
    pub fn fail_value(&self, value: &str) {
        self.lock().failing_values.insert(value.to_string());
    }

    /// Removes an injected per-value failure.
    pub fn heal_value(&self, value: &str) {
        self.lock().failing_values.remove(value);
    }

    /// Simulates a full network outage for every endpoint.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Returns the calls received so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Returns the stored districts without recording a call.
    pub fn snapshot(&self) -> Vec<District> {
        self.lock()
            .districts
            .iter()
            .map(StoredDistrict::to_district)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DistrictRemote for InMemoryDistrictRemote {
    fn remote_id(&self) -> &str {
        "memory"
    }

    fn add_panchayath(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::AddPanchayath {
            district: district_name.to_string(),
            value: value.to_string(),
        });
        state.add(district_name, value, false)
    }

    fn add_pincode(&self, district_name: &str, value: &str) -> RemoteResult<RemoteAck> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::AddPincode {
            district: district_name.to_string(),
            value: value.to_string(),
        });
        state.add(district_name, value, true)
    }

    fn delete_panchayath(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::DeletePanchayath {
            district_id: district_id.to_string(),
            value: value.to_string(),
        });
        state.delete(district_id, value, false)
    }

    fn delete_pincode(&self, district_id: &str, value: &str) -> RemoteResult<RemoteAck> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::DeletePincode {
            district_id: district_id.to_string(),
            value: value.to_string(),
        });
        state.delete(district_id, value, true)
    }

    fn delete_district(&self, district_id: &str) -> RemoteResult<()> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::DeleteDistrict {
            district_id: district_id.to_string(),
        });
        state.check_reachable(None)?;
        let before = state.districts.len();
        state.districts.retain(|district| district.id != district_id);
        if state.districts.len() == before {
            return Err(RemoteError::rejected(404, "District not found"));
        }
        Ok(())
    }

    fn list_districts(&self) -> RemoteResult<Vec<District>> {
        let mut state = self.lock();
        state.calls.push(RemoteCall::List);
        state.check_reachable(None)?;
        Ok(state
            .districts
            .iter()
            .map(StoredDistrict::to_district)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryDistrictRemote, RemoteCall};
    use crate::sync::remote::{DistrictRemote, REMOTE_ERROR_REJECTED, REMOTE_ERROR_TRANSPORT};

    #[test]
    fn first_add_creates_district_and_later_adds_append() {
        let remote = InMemoryDistrictRemote::new();
        let first = remote.add_panchayath("Kasaragod", "Bedadka").expect("first add");
        let second = remote.add_pincode("Kasaragod", "671121").expect("second add");

        assert_eq!(first.district_id, second.district_id);
        let listing = remote.list_districts().expect("list");
        assert_eq!(listing.len(), 1);
        assert!(listing[0].panchayaths.contains("Bedadka"));
        assert!(listing[0].pincodes.contains("671121"));
    }

    #[test]
    fn delete_of_missing_value_is_rejected() {
        let remote = InMemoryDistrictRemote::new();
        let id = remote.seed("Malappuram", ["Tirur"], Vec::<&str>::new());

        let err = remote
            .delete_panchayath(&id, "Ponnani")
            .expect_err("missing value must fail");
        assert_eq!(err.code, REMOTE_ERROR_REJECTED);
        assert_eq!(err.status, Some(404));

        remote.delete_panchayath(&id, "Tirur").expect("existing value deletes");
        assert!(remote.snapshot()[0].panchayaths.is_empty());
    }

    #[test]
    fn offline_fails_every_endpoint_but_records_calls() {
        let remote = InMemoryDistrictRemote::new();
        let id = remote.seed("Kozhikode", ["Vadakara"], ["673101"]);
        remote.set_offline(true);

        let err = remote.list_districts().expect_err("offline list fails");
        assert_eq!(err.code, REMOTE_ERROR_TRANSPORT);
        assert!(remote.delete_district(&id).is_err());
        assert_eq!(remote.calls().len(), 2);

        remote.set_offline(false);
        remote.delete_district(&id).expect("online delete succeeds");
        assert!(remote.snapshot().is_empty());
    }

    #[test]
    fn injected_failure_can_be_healed() {
        let remote = InMemoryDistrictRemote::new();
        remote.fail_value("Feroke");
        assert!(remote.add_panchayath("Kozhikode", "Feroke").is_err());
        remote.heal_value("Feroke");
        remote
            .add_panchayath("Kozhikode", "Feroke")
            .expect("healed value adds");
        assert_eq!(
            remote.calls()[1],
            RemoteCall::AddPanchayath {
                district: "Kozhikode".to_string(),
                value: "Feroke".to_string(),
            }
        );
    }
}
