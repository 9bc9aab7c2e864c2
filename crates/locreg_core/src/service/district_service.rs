//! District sync use-case service.
//!
//! # Responsibility
//! - Provide use-case entry points: reload, edit, create, delete.
//! - Drive the diff → execute → reconcile pipeline for each of them.
//!
//! # Invariants
//! - Validation errors are returned before any remote call is made.
//! - An empty plan never reaches the executor.
//! - Reconciliation runs only after the executor returned a complete report.
//! - Edits for different districts may execute concurrently; two edits for
//!   the same district in one batch are rejected.

use crate::model::district::{ChildKind, District, DistrictId};
use crate::model::draft::DistrictDraft;
use crate::model::operation::DistrictRef;
use crate::model::validation::{AcceptAll, ChildValueValidator, DistrictValidationError};
use crate::repo::registry::{LocationRegistry, RegistryError};
use crate::service::bulk_create::plan_creation;
use crate::service::diff_engine::{compute_plan, ReconciliationPlan};
use crate::service::reconciler::{LocalStateReconciler, SyncOutcome};
use crate::sync::executor::{ExecutionReport, SyncExecutor};
use crate::sync::remote::{DistrictRemote, RemoteError};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for district sync use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncServiceError {
    /// Input rejected before any network call.
    Validation(DistrictValidationError),
    /// Target district is not in the local registry.
    DistrictNotFound(DistrictId),
    /// The same district appears twice in one concurrent edit batch.
    ConflictingEdits(DistrictId),
    /// A single-call use-case (listing, district deletion) failed remotely.
    Remote(RemoteError),
    /// Registry invariant breach while applying results.
    Registry(RegistryError),
}

impl Display for SyncServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DistrictNotFound(id) => write!(f, "district not found: {id}"),
            Self::ConflictingEdits(id) => {
                write!(f, "district `{id}` appears more than once in one edit batch")
            }
            Self::Remote(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::DistrictNotFound(_) | Self::ConflictingEdits(_) => None,
        }
    }
}

impl From<DistrictValidationError> for SyncServiceError {
    fn from(value: DistrictValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for SyncServiceError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<RegistryError> for SyncServiceError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::DistrictNotFound(id) => Self::DistrictNotFound(id),
            other => Self::Registry(other),
        }
    }
}

pub type SyncServiceResult<T> = Result<T, SyncServiceError>;

/// A validated edit ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEdit {
    pub district_id: DistrictId,
    /// Backend grouping name of the persisted record.
    pub persisted_name: String,
    pub desired: District,
    pub plan: ReconciliationPlan,
}

/// Use-case facade over one remote and the local registry.
pub struct DistrictSyncService<R: DistrictRemote> {
    remote: R,
    reconciler: LocalStateReconciler,
    validator: Box<dyn ChildValueValidator + Send + Sync>,
}

impl<R: DistrictRemote> DistrictSyncService<R> {
    /// Creates a service with no child-value format checks.
    pub fn new(remote: R) -> Self {
        Self::with_validator(remote, Box::new(AcceptAll))
    }

    /// Creates a service that format-checks every value before adding it.
    pub fn with_validator(
        remote: R,
        validator: Box<dyn ChildValueValidator + Send + Sync>,
    ) -> Self {
        Self {
            remote,
            reconciler: LocalStateReconciler::new(),
            validator,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Read-only view of local state.
    pub fn registry(&self) -> &LocationRegistry {
        self.reconciler.registry()
    }

    /// Replaces local state with the backend listing.
    ///
    /// Returns the number of districts loaded. On failure local state is
    /// left as it was.
    pub fn reload(&mut self) -> SyncServiceResult<usize> {
        let listing = self.remote.list_districts().map_err(|err| {
            warn!(
                "event=registry_reload module=service status=error error_code={}",
                err.code
            );
            err
        })?;
        let count = listing.len();
        self.reconciler.load_listing(listing);
        Ok(count)
    }

    /// Starts an edit session for one district.
    pub fn begin_edit(&self, district_id: &str) -> SyncServiceResult<DistrictDraft> {
        self.persisted(district_id).map(DistrictDraft::from_district)
    }

    /// Validates `draft` and computes its plan without touching the backend.
    pub fn prepare_edit(
        &self,
        district_id: &str,
        draft: &DistrictDraft,
    ) -> SyncServiceResult<PreparedEdit> {
        let persisted = self.persisted(district_id)?;
        let desired = draft.into_desired(persisted.id.clone())?;
        let plan = compute_plan(persisted, &desired);

        for kind in [ChildKind::Panchayath, ChildKind::Pincode] {
            for value in plan.to_add(kind) {
                self.validator.check(kind, value)?;
            }
        }

        Ok(PreparedEdit {
            district_id: district_id.to_string(),
            persisted_name: persisted.name.clone(),
            desired,
            plan,
        })
    }

    /// Saves an edit session: diff, execute, reconcile.
    ///
    /// # Errors
    /// - `Validation` for invalid drafts; nothing is sent.
    /// - `DistrictNotFound` when the district is not loaded.
    ///
    /// Remote failures are reported inside the returned outcome.
    pub fn submit_edit(
        &mut self,
        district_id: &str,
        draft: &DistrictDraft,
    ) -> SyncServiceResult<SyncOutcome> {
        let prepared = self.prepare_edit(district_id, draft)?;
        if prepared.plan.is_empty() {
            info!(
                "event=edit_submit module=service status=ok district_id={} operations=0 name_changed={}",
                district_id, prepared.plan.name_changed
            );
            return self.finish_edit(&prepared, None);
        }

        let operations = prepared.plan.operations(&DistrictRef::new(
            Some(prepared.district_id.clone()),
            prepared.persisted_name.clone(),
        ));
        let report = SyncExecutor::new(&self.remote).execute(operations);
        self.finish_edit(&prepared, Some(&report))
    }

    /// Saves edits for several districts, executing them concurrently.
    ///
    /// Every draft is validated before any call is made. Outcomes are
    /// returned in input order.
    pub fn submit_edits(
        &mut self,
        edits: &[(DistrictId, DistrictDraft)],
    ) -> SyncServiceResult<Vec<SyncOutcome>>
    where
        R: Sync,
    {
        let mut seen = BTreeSet::new();
        let mut prepared = Vec::with_capacity(edits.len());
        for (district_id, draft) in edits {
            if !seen.insert(district_id.as_str()) {
                return Err(SyncServiceError::ConflictingEdits(district_id.clone()));
            }
            prepared.push(self.prepare_edit(district_id, draft)?);
        }

        let batches: Vec<_> = prepared
            .iter()
            .filter(|edit| !edit.plan.is_empty())
            .map(|edit| {
                edit.plan.operations(&DistrictRef::new(
                    Some(edit.district_id.clone()),
                    edit.persisted_name.clone(),
                ))
            })
            .collect();
        let mut reports = SyncExecutor::new(&self.remote)
            .execute_batches(batches)
            .into_iter();

        let mut outcomes = Vec::with_capacity(prepared.len());
        for edit in &prepared {
            let report = if edit.plan.is_empty() {
                None
            } else {
                reports.next()
            };
            outcomes.push(self.finish_edit(edit, report.as_ref())?);
        }
        Ok(outcomes)
    }

    /// Creates a new district from a draft via one add call per value.
    ///
    /// When every call fails, nothing is registered and the outcome status is
    /// `TotalFailure`. A draft naming a loaded district may only carry values
    /// that district does not hold yet.
    pub fn create_district(&mut self, draft: &DistrictDraft) -> SyncServiceResult<SyncOutcome> {
        let existing = self.registry().find_by_name(&draft.name);
        let batch = plan_creation(draft, existing, self.validator.as_ref())?;
        info!(
            "event=district_create module=service status=start operations={}",
            batch.operations.len()
        );
        let report = SyncExecutor::new(&self.remote).execute(batch.operations);
        let mut outcome = self.reconciler.apply_creation(&batch.district.name, &report);

        if !outcome.applied.is_empty() && outcome.district_id.is_none() {
            outcome.district_id = self.discover_id(&batch.district.name);
        }
        Ok(outcome)
    }

    /// Deletes a district and all of its children.
    ///
    /// Returns the removed record. On remote failure local state is kept.
    pub fn delete_district(&mut self, district_id: &str) -> SyncServiceResult<District> {
        self.persisted(district_id)?;
        let result = self.remote.delete_district(district_id);
        match self.reconciler.apply_district_deletion(district_id, &result)? {
            Some(removed) => Ok(removed),
            None => Err(result
                .err()
                .map(SyncServiceError::Remote)
                .unwrap_or_else(|| SyncServiceError::DistrictNotFound(district_id.to_string()))),
        }
    }

    /// Deletes one child value through the regular edit pipeline.
    ///
    /// Deleting a value the district does not hold is a no-op.
    pub fn delete_child(
        &mut self,
        district_id: &str,
        kind: ChildKind,
        value: &str,
    ) -> SyncServiceResult<SyncOutcome> {
        let mut draft = self.begin_edit(district_id)?;
        match kind {
            ChildKind::Panchayath => draft.remove_panchayath(value),
            ChildKind::Pincode => draft.remove_pincode(value),
        };
        self.submit_edit(district_id, &draft)
    }

    fn finish_edit(
        &mut self,
        prepared: &PreparedEdit,
        report: Option<&ExecutionReport>,
    ) -> SyncServiceResult<SyncOutcome> {
        Ok(self.reconciler.apply_edit(
            &prepared.district_id,
            &prepared.plan,
            &prepared.desired.name,
            report,
        )?)
    }

    fn persisted(&self, district_id: &str) -> SyncServiceResult<&District> {
        self.reconciler
            .registry()
            .get(district_id)
            .ok_or_else(|| SyncServiceError::DistrictNotFound(district_id.to_string()))
    }

    // The add endpoint does not always echo the record id; look it up once.
    fn discover_id(&mut self, district_name: &str) -> Option<DistrictId> {
        let listing = match self.remote.list_districts() {
            Ok(listing) => listing,
            Err(err) => {
                warn!(
                    "event=district_create module=service status=error step=discover_id error_code={}",
                    err.code
                );
                return None;
            }
        };
        let id = listing
            .into_iter()
            .find(|district| district.name.trim() == district_name.trim())
            .and_then(|district| district.id)?;
        self.reconciler.assign_missing_id(district_name, &id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{DistrictSyncService, SyncServiceError};
    use crate::model::district::ChildKind;
    use crate::model::draft::DistrictDraft;
    use crate::model::validation::{DistrictValidationError, PincodeFormatValidator};
    use crate::service::reconciler::OutcomeStatus;
    use crate::sync::memory_remote::{InMemoryDistrictRemote, RemoteCall};

    fn loaded_service() -> (DistrictSyncService<InMemoryDistrictRemote>, String) {
        let remote = InMemoryDistrictRemote::new();
        let id = remote.seed("Kollam", ["A", "B"], ["691001"]);
        let mut service = DistrictSyncService::new(remote);
        service.reload().expect("reload");
        (service, id)
    }

    #[test]
    fn unchanged_draft_makes_no_calls() {
        let (mut service, id) = loaded_service();
        let draft = service.begin_edit(&id).expect("begin");

        let outcome = service.submit_edit(&id, &draft).expect("submit");
        assert_eq!(outcome.status, OutcomeStatus::NoChanges);
        assert_eq!(service.remote().calls(), vec![RemoteCall::List]);
    }

    #[test]
    fn invalid_draft_is_rejected_before_any_call() {
        let (mut service, id) = loaded_service();
        let mut draft = service.begin_edit(&id).expect("begin");
        draft.name = "   ".to_string();

        let err = service.submit_edit(&id, &draft).expect_err("blank name");
        assert_eq!(
            err,
            SyncServiceError::Validation(DistrictValidationError::EmptyName)
        );
        assert_eq!(service.remote().calls().len(), 1);
    }

    #[test]
    fn validator_only_checks_added_values() {
        let remote = InMemoryDistrictRemote::new();
        let id = remote.seed("Kollam", ["A"], ["legacy"]);
        let mut service =
            DistrictSyncService::with_validator(remote, Box::new(PincodeFormatValidator));
        service.reload().expect("reload");

        let mut draft = service.begin_edit(&id).expect("begin");
        draft.push_panchayath("B").expect("push");
        service
            .submit_edit(&id, &draft)
            .expect("kept legacy pincode is not re-validated");

        draft.push_pincode("12").expect("push");
        assert!(matches!(
            service.submit_edit(&id, &draft),
            Err(SyncServiceError::Validation(
                DistrictValidationError::InvalidFormat { .. }
            ))
        ));
    }

    #[test]
    fn unknown_district_is_reported() {
        let (mut service, _) = loaded_service();
        let err = service
            .delete_child("missing", ChildKind::Pincode, "691001")
            .expect_err("unknown id");
        assert_eq!(err, SyncServiceError::DistrictNotFound("missing".to_string()));
    }

    #[test]
    fn delete_child_removes_one_value() {
        let (mut service, id) = loaded_service();
        let outcome = service
            .delete_child(&id, ChildKind::Panchayath, "A")
            .expect("delete child");

        assert_eq!(outcome.status, OutcomeStatus::Applied);
        let district = service.registry().get(&id).expect("district");
        assert!(!district.panchayaths.contains("A"));
        assert!(district.panchayaths.contains("B"));
    }

    #[test]
    fn failed_district_deletion_keeps_local_record() {
        let (mut service, id) = loaded_service();
        service.remote().set_offline(true);

        let err = service.delete_district(&id).expect_err("offline delete");
        assert!(matches!(err, SyncServiceError::Remote(_)));
        assert!(service.registry().get(&id).is_some());

        service.remote().set_offline(false);
        let removed = service.delete_district(&id).expect("online delete");
        assert_eq!(removed.name, "Kollam");
        assert!(service.registry().is_empty());
    }

    #[test]
    fn conflicting_batch_edits_are_rejected() {
        let (mut service, id) = loaded_service();
        let draft = DistrictDraft::new("Kollam");
        let err = service
            .submit_edits(&[(id.clone(), draft.clone()), (id.clone(), draft)])
            .expect_err("same district twice");
        assert_eq!(err, SyncServiceError::ConflictingEdits(id));
        assert_eq!(service.remote().calls().len(), 1);
    }
}
