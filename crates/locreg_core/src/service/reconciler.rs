//! Local state reconciliation after remote execution.
//!
//! # Responsibility
//! - Own the in-memory registry and be its only writer.
//! - Fold execution reports back into district records.
//! - Turn reports into caller-facing outcomes.
//!
//! # Invariants
//! - Only succeeded operations change local state; failed ones are dropped.
//! - After an edit, a district holds exactly its persisted values plus the
//!   succeeded adds minus the succeeded removes.
//! - A local rename never touches `District::name`; it is kept as an
//!   unpersisted display name.
//! - A creation where every operation failed registers nothing.

use crate::model::district::{District, DistrictId};
use crate::model::operation::ChildChange;
use crate::repo::registry::{LocationRegistry, RegistryError, RegistryResult};
use crate::service::diff_engine::ReconciliationPlan;
use crate::sync::executor::ExecutionReport;
use crate::sync::remote::{RemoteError, RemoteResult};
use log::{info, warn};

/// Overall result category of one sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Nothing had to be sent to the backend.
    NoChanges,
    /// Every operation succeeded.
    Applied,
    /// Some operations succeeded and some failed.
    PartialApplication,
    /// Every operation failed; local state is unchanged.
    TotalFailure,
}

/// A change the backend did not apply, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedChange {
    pub change: ChildChange,
    pub reason: RemoteError,
}

/// Caller-facing result of one edit, creation or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub status: OutcomeStatus,
    /// District the outcome refers to, when it exists on the backend.
    pub district_id: Option<DistrictId>,
    /// Changes now reflected both remotely and locally.
    pub applied: Vec<ChildChange>,
    /// Changes that were not applied anywhere.
    pub failed: Vec<FailedChange>,
    /// The displayed name differs from the name stored on the backend.
    pub name_unpersisted: bool,
}

impl SyncOutcome {
    fn from_report(
        district_id: Option<DistrictId>,
        report: Option<&ExecutionReport>,
        name_unpersisted: bool,
    ) -> Self {
        let (applied, failed) = match report {
            Some(report) => (
                report
                    .succeeded
                    .iter()
                    .map(|operation| operation.change.clone())
                    .collect(),
                report
                    .failed
                    .iter()
                    .map(|failure| FailedChange {
                        change: failure.operation.change.clone(),
                        reason: failure.reason.clone(),
                    })
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            status: status_for(report),
            district_id,
            applied,
            failed,
            name_unpersisted,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::NoChanges | OutcomeStatus::Applied)
    }
}

fn status_for(report: Option<&ExecutionReport>) -> OutcomeStatus {
    match report {
        None => OutcomeStatus::NoChanges,
        Some(report) if report.attempted() == 0 => OutcomeStatus::NoChanges,
        Some(report) if report.failed.is_empty() => OutcomeStatus::Applied,
        Some(report) if report.succeeded.is_empty() => OutcomeStatus::TotalFailure,
        Some(_) => OutcomeStatus::PartialApplication,
    }
}

/// Single writer of the in-memory registry.
#[derive(Debug, Default)]
pub struct LocalStateReconciler {
    registry: LocationRegistry,
}

impl LocalStateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the registry.
    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    /// Replaces all local state with a fresh server listing.
    pub fn load_listing(&mut self, listing: Vec<District>) {
        info!(
            "event=registry_load module=reconciler status=ok districts={}",
            listing.len()
        );
        self.registry.load(listing);
    }

    /// Applies an edit session's report to one district.
    ///
    /// `report` is `None` when the plan was empty and nothing was executed.
    /// A name change is recorded as display-only.
    ///
    /// # Errors
    /// - `DistrictNotFound` when the district vanished from the registry
    ///   (e.g. an explicit reload) before the report was applied.
    pub fn apply_edit(
        &mut self,
        district_id: &str,
        plan: &ReconciliationPlan,
        desired_name: &str,
        report: Option<&ExecutionReport>,
    ) -> RegistryResult<SyncOutcome> {
        let mut district = self
            .registry
            .get(district_id)
            .cloned()
            .ok_or_else(|| RegistryError::DistrictNotFound(district_id.to_string()))?;

        if let Some(report) = report {
            for operation in &report.succeeded {
                apply_change(&mut district, &operation.change);
            }
        }
        if plan.name_changed {
            set_display_name(&mut district, desired_name);
        }

        let name_unpersisted = district.has_unpersisted_name();
        self.registry.replace(district_id, district)?;

        let outcome = SyncOutcome::from_report(
            Some(district_id.to_string()),
            report,
            name_unpersisted,
        );
        log_outcome("edit", &outcome);
        Ok(outcome)
    }

    /// Applies a bulk-create report.
    ///
    /// A district counts as created when at least one operation succeeded.
    /// When the backend already had a district with this name, the new values
    /// are merged into that record instead of adding a second one.
    pub fn apply_creation(&mut self, district_name: &str, report: &ExecutionReport) -> SyncOutcome {
        if report.succeeded.is_empty() {
            let outcome = SyncOutcome::from_report(None, Some(report), false);
            log_outcome("create", &outcome);
            return outcome;
        }

        let district_id = match self.registry.find_by_name_mut(district_name) {
            Some(existing) => {
                if existing.id.is_none() {
                    existing.id = report.assigned_id.clone();
                }
                for operation in &report.succeeded {
                    apply_change(existing, &operation.change);
                }
                existing.id.clone()
            }
            None => {
                let mut district = District::new(district_name.trim());
                district.id = report.assigned_id.clone();
                for operation in &report.succeeded {
                    apply_change(&mut district, &operation.change);
                }
                let id = district.id.clone();
                self.registry.insert(district);
                id
            }
        };

        let outcome = SyncOutcome::from_report(district_id, Some(report), false);
        log_outcome("create", &outcome);
        outcome
    }

    /// Records a backend id discovered after creation for a district that
    /// was registered without one. Returns false when no such record exists.
    pub fn assign_missing_id(&mut self, district_name: &str, district_id: &str) -> bool {
        match self.registry.find_by_name_mut(district_name) {
            Some(district) if district.id.is_none() => {
                district.id = Some(district_id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Removes a district locally once the backend confirmed its deletion.
    ///
    /// Returns the removed record, or `None` when the remote call failed and
    /// local state was left untouched.
    pub fn apply_district_deletion(
        &mut self,
        district_id: &str,
        result: &RemoteResult<()>,
    ) -> RegistryResult<Option<District>> {
        match result {
            Ok(()) => {
                let removed = self.registry.remove(district_id)?;
                info!(
                    "event=reconcile_apply module=reconciler status=ok action=delete_district district_id={}",
                    district_id
                );
                Ok(Some(removed))
            }
            Err(err) => {
                warn!(
                    "event=reconcile_apply module=reconciler status=error action=delete_district district_id={} error_code={}",
                    district_id, err.code
                );
                Ok(None)
            }
        }
    }
}

fn apply_change(district: &mut District, change: &ChildChange) {
    let values = district.children_mut(change.kind());
    if change.is_add() {
        values.insert(change.value().to_string());
    } else {
        values.shift_remove(change.value());
    }
}

fn set_display_name(district: &mut District, desired_name: &str) {
    let desired = desired_name.trim();
    if desired.is_empty() || desired == district.name.trim() {
        district.unpersisted_name = None;
    } else {
        district.unpersisted_name = Some(desired.to_string());
    }
}

fn log_outcome(action: &str, outcome: &SyncOutcome) {
    let status = match outcome.status {
        OutcomeStatus::NoChanges | OutcomeStatus::Applied => "ok",
        OutcomeStatus::PartialApplication => "partial",
        OutcomeStatus::TotalFailure => "error",
    };
    info!(
        "event=reconcile_apply module=reconciler status={} action={} district_id={} applied={} failed={} name_unpersisted={}",
        status,
        action,
        outcome.district_id.as_deref().unwrap_or("-"),
        outcome.applied.len(),
        outcome.failed.len(),
        outcome.name_unpersisted
    );
}

#[cfg(test)]
mod tests {
    use super::{LocalStateReconciler, OutcomeStatus};
    use crate::model::district::District;
    use crate::model::operation::{ChildChange, DistrictRef, Operation};
    use crate::service::diff_engine::{compute_plan, ReconciliationPlan};
    use crate::sync::executor::{ExecutionReport, FailedOperation};
    use crate::sync::remote::RemoteError;
    use uuid::Uuid;

    fn reconciler_with(district: District) -> LocalStateReconciler {
        let mut reconciler = LocalStateReconciler::new();
        reconciler.load_listing(vec![district]);
        reconciler
    }

    fn report(succeeded: Vec<ChildChange>, failed: Vec<ChildChange>) -> ExecutionReport {
        let target = DistrictRef::new(Some("d1".to_string()), "Kollam");
        ExecutionReport {
            session_id: Uuid::new_v4(),
            succeeded: succeeded
                .into_iter()
                .map(|change| Operation::new(target.clone(), change))
                .collect(),
            failed: failed
                .into_iter()
                .map(|change| FailedOperation {
                    operation: Operation::new(target.clone(), change),
                    reason: RemoteError::transport("offline"),
                })
                .collect(),
            assigned_id: None,
        }
    }

    #[test]
    fn only_succeeded_changes_are_applied() {
        let mut reconciler =
            reconciler_with(District::with_id("d1", "Kollam").with_panchayaths(["A", "B"]));
        let report = report(
            vec![
                ChildChange::AddPanchayath("C".to_string()),
                ChildChange::RemovePanchayath("A".to_string()),
            ],
            vec![ChildChange::AddPanchayath("D".to_string())],
        );

        let outcome = reconciler
            .apply_edit("d1", &ReconciliationPlan::default(), "Kollam", Some(&report))
            .expect("apply should succeed");

        assert_eq!(outcome.status, OutcomeStatus::PartialApplication);
        assert_eq!(outcome.failed.len(), 1);
        let district = reconciler.registry().get("d1").expect("d1");
        let values: Vec<&str> = district.panchayaths.iter().map(String::as_str).collect();
        assert_eq!(values, vec!["B", "C"]);
    }

    #[test]
    fn name_change_is_display_only() {
        let persisted = District::with_id("d1", "Kollam").with_pincodes(["691001"]);
        let desired = District::with_id("d1", "Quilon").with_pincodes(["691001"]);
        let plan = compute_plan(&persisted, &desired);
        let mut reconciler = reconciler_with(persisted);

        let outcome = reconciler
            .apply_edit("d1", &plan, "Quilon", None)
            .expect("apply should succeed");

        assert_eq!(outcome.status, OutcomeStatus::NoChanges);
        assert!(outcome.name_unpersisted);
        let district = reconciler.registry().get("d1").expect("d1");
        assert_eq!(district.name, "Kollam");
        assert_eq!(district.display_name(), "Quilon");
    }

    #[test]
    fn renaming_back_clears_marker() {
        let mut persisted = District::with_id("d1", "Kollam");
        persisted.unpersisted_name = Some("Quilon".to_string());
        let desired = District::with_id("d1", "Kollam");
        let plan = compute_plan(&persisted, &desired);
        let mut reconciler = reconciler_with(persisted);

        let outcome = reconciler
            .apply_edit("d1", &plan, "Kollam", None)
            .expect("apply should succeed");
        assert!(!outcome.name_unpersisted);
        assert!(!reconciler.registry().get("d1").expect("d1").has_unpersisted_name());
    }

    #[test]
    fn apply_edit_reports_missing_district() {
        let mut reconciler = LocalStateReconciler::new();
        assert!(reconciler
            .apply_edit("nope", &ReconciliationPlan::default(), "x", None)
            .is_err());
    }

    #[test]
    fn failed_creation_registers_nothing() {
        let mut reconciler = LocalStateReconciler::new();
        let report = report(vec![], vec![ChildChange::AddPanchayath("X".to_string())]);

        let outcome = reconciler.apply_creation("Wayanad", &report);
        assert_eq!(outcome.status, OutcomeStatus::TotalFailure);
        assert!(outcome.district_id.is_none());
        assert!(reconciler.registry().is_empty());
    }

    #[test]
    fn creation_merges_into_existing_name() {
        let mut reconciler =
            reconciler_with(District::with_id("d1", "Kollam").with_panchayaths(["A"]));
        let mut report = report(vec![ChildChange::AddPincode("691001".to_string())], vec![]);
        report.assigned_id = Some("d1".to_string());

        let outcome = reconciler.apply_creation("Kollam", &report);
        assert_eq!(outcome.status, OutcomeStatus::Applied);
        assert_eq!(reconciler.registry().len(), 1);
        assert_eq!(
            reconciler.registry().get("d1").expect("d1").child_count(),
            2
        );
    }

    #[test]
    fn discovered_id_fills_only_missing_ids() {
        let mut reconciler = LocalStateReconciler::new();
        let report = report(vec![ChildChange::AddPanchayath("X".to_string())], vec![]);
        let outcome = reconciler.apply_creation("Wayanad", &report);
        assert!(outcome.district_id.is_none());

        assert!(reconciler.assign_missing_id("Wayanad", "w1"));
        assert!(!reconciler.assign_missing_id("Wayanad", "w2"));
        assert_eq!(reconciler.registry().get("w1").expect("w1").name, "Wayanad");
    }

    #[test]
    fn deletion_only_applies_after_remote_success() {
        let mut reconciler = reconciler_with(District::with_id("d1", "Kollam"));

        let kept = reconciler
            .apply_district_deletion("d1", &Err(RemoteError::transport("offline")))
            .expect("failed delete is not an error");
        assert!(kept.is_none());
        assert_eq!(reconciler.registry().len(), 1);

        let removed = reconciler
            .apply_district_deletion("d1", &Ok(()))
            .expect("delete applies");
        assert_eq!(removed.expect("removed record").name, "Kollam");
        assert!(reconciler.registry().is_empty());
    }
}
