//! Sequential executor for atomic district operations.
//!
//! # Responsibility
//! - Run an ordered operation list against a `DistrictRemote`.
//! - Record the outcome of every operation in one `ExecutionReport`.
//!
//! # Invariants
//! - Operations of one list run sequentially, in list order.
//! - Every operation is attempted; a failure never short-circuits the rest.
//! - Remote failures are captured per operation and never escape.
//! - Different lists (one per district) may run concurrently.

use crate::model::district::DistrictId;
use crate::model::operation::{ChildChange, Operation};
use crate::sync::remote::{DistrictRemote, RemoteAck, RemoteError, RemoteResult};
use log::{debug, info, warn};
use std::time::Instant;
use uuid::Uuid;

/// One operation that did not take effect on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedOperation {
    pub operation: Operation,
    pub reason: RemoteError,
}

/// Complete outcome of one executed operation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Correlates log lines of one execution.
    pub session_id: Uuid,
    /// Operations acknowledged by the backend, in execution order.
    pub succeeded: Vec<Operation>,
    /// Operations that failed, in execution order.
    pub failed: Vec<FailedOperation>,
    /// First district id reported by a successful call.
    pub assigned_id: Option<DistrictId>,
}

impl ExecutionReport {
    fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
            assigned_id: None,
        }
    }

    /// Number of operations that were attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when operations were attempted and none succeeded.
    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    /// True when at least one operation succeeded and at least one failed.
    pub fn is_partial(&self) -> bool {
        !self.succeeded.is_empty() && !self.failed.is_empty()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs operation lists one call at a time.
pub struct SyncExecutor<'r, R: DistrictRemote + ?Sized> {
    remote: &'r R,
}

impl<'r, R: DistrictRemote + ?Sized> SyncExecutor<'r, R> {
    pub fn new(remote: &'r R) -> Self {
        Self { remote }
    }

    /// Executes all operations in order and reports each outcome.
    ///
    /// # Side effects
    /// - One remote round trip per operation, except removals without a
    ///   district id, which fail locally.
    /// - Emits `sync_execute` logging events.
    pub fn execute(&self, operations: Vec<Operation>) -> ExecutionReport {
        let session_id = Uuid::new_v4();
        let started_at = Instant::now();
        let mut report = ExecutionReport::new(session_id);
        info!(
            "event=sync_execute module=sync status=start session={} remote={} operations={}",
            session_id,
            self.remote.remote_id(),
            operations.len()
        );

        for operation in operations {
            match self.dispatch(&operation) {
                Ok(ack) => {
                    debug!(
                        "event=sync_op module=sync status=ok session={} op={} value={}",
                        session_id,
                        operation.change.label(),
                        operation.change.value()
                    );
                    if report.assigned_id.is_none() {
                        report.assigned_id = ack.district_id;
                    }
                    report.succeeded.push(operation);
                }
                Err(reason) => {
                    warn!(
                        "event=sync_op module=sync status=error session={} op={} error_code={} retryable={}",
                        session_id,
                        operation.change.label(),
                        reason.code,
                        reason.retryable
                    );
                    report.failed.push(FailedOperation { operation, reason });
                }
            }
        }

        let status = if report.failed.is_empty() {
            "ok"
        } else if report.succeeded.is_empty() {
            "error"
        } else {
            "partial"
        };
        info!(
            "event=sync_execute module=sync status={} session={} succeeded={} failed={} duration_ms={}",
            status,
            session_id,
            report.succeeded.len(),
            report.failed.len(),
            started_at.elapsed().as_millis()
        );
        report
    }

    /// Executes independent operation lists, one thread per list.
    ///
    /// Each list must target a single district; lists for different districts
    /// have no ordering requirement between them. Reports are returned in
    /// input order.
    pub fn execute_batches(&self, batches: Vec<Vec<Operation>>) -> Vec<ExecutionReport>
    where
        R: Sync,
    {
        if batches.len() <= 1 {
            return batches
                .into_iter()
                .map(|operations| self.execute(operations))
                .collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = batches
                .into_iter()
                .map(|operations| scope.spawn(move || self.execute(operations)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(report) => report,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    fn dispatch(&self, operation: &Operation) -> RemoteResult<RemoteAck> {
        let target = &operation.target;
        match &operation.change {
            ChildChange::AddPanchayath(value) => self.remote.add_panchayath(&target.name, value),
            ChildChange::AddPincode(value) => self.remote.add_pincode(&target.name, value),
            ChildChange::RemovePanchayath(value) => {
                let id = require_id(operation)?;
                self.remote.delete_panchayath(id, value)
            }
            ChildChange::RemovePincode(value) => {
                let id = require_id(operation)?;
                self.remote.delete_pincode(id, value)
            }
        }
    }
}

fn require_id(operation: &Operation) -> RemoteResult<&str> {
    operation
        .target
        .id
        .as_deref()
        .ok_or_else(|| RemoteError::district_id_missing(&operation.target.name))
}

#[cfg(test)]
mod tests {
    use super::SyncExecutor;
    use crate::model::operation::{ChildChange, DistrictRef, Operation};
    use crate::sync::memory_remote::{InMemoryDistrictRemote, RemoteCall};
    use crate::sync::remote::REMOTE_ERROR_DISTRICT_ID_MISSING;

    fn op(id: Option<&str>, name: &str, change: ChildChange) -> Operation {
        Operation::new(DistrictRef::new(id.map(str::to_string), name), change)
    }

    #[test]
    fn empty_list_yields_empty_report() {
        let remote = InMemoryDistrictRemote::new();
        let report = SyncExecutor::new(&remote).execute(Vec::new());
        assert_eq!(report.attempted(), 0);
        assert!(!report.is_total_failure());
        assert!(report.is_complete_success());
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn failure_does_not_stop_remaining_operations() {
        let remote = InMemoryDistrictRemote::new();
        remote.fail_value("B");

        let report = SyncExecutor::new(&remote).execute(vec![
            op(None, "Kollam", ChildChange::AddPanchayath("A".to_string())),
            op(None, "Kollam", ChildChange::AddPanchayath("B".to_string())),
            op(None, "Kollam", ChildChange::AddPincode("691001".to_string())),
        ]);

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].operation.change.value(), "B");
        assert!(report.is_partial());
        assert_eq!(remote.calls().len(), 3);
        assert!(report.assigned_id.is_some());
    }

    #[test]
    fn removal_without_id_fails_locally() {
        let remote = InMemoryDistrictRemote::new();
        let report = SyncExecutor::new(&remote).execute(vec![op(
            None,
            "Kollam",
            ChildChange::RemovePincode("691001".to_string()),
        )]);

        assert!(report.is_total_failure());
        assert_eq!(report.failed[0].reason.code, REMOTE_ERROR_DISTRICT_ID_MISSING);
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn operations_run_in_list_order() {
        let remote = InMemoryDistrictRemote::new();
        let id = remote.seed("Kollam", ["A"], ["691001"]);

        SyncExecutor::new(&remote).execute(vec![
            op(Some(&id), "Kollam", ChildChange::AddPanchayath("B".to_string())),
            op(Some(&id), "Kollam", ChildChange::RemovePanchayath("A".to_string())),
            op(Some(&id), "Kollam", ChildChange::RemovePincode("691001".to_string())),
        ]);

        let calls = remote.calls();
        assert!(matches!(calls[0], RemoteCall::AddPanchayath { .. }));
        assert!(matches!(calls[1], RemoteCall::DeletePanchayath { .. }));
        assert!(matches!(calls[2], RemoteCall::DeletePincode { .. }));
    }

    #[test]
    fn batches_report_in_input_order() {
        let remote = InMemoryDistrictRemote::new();
        let kollam = remote.seed("Kollam", ["A"], Vec::<&str>::new());
        let idukki = remote.seed("Idukki", ["X"], Vec::<&str>::new());
        remote.fail_value("Y");

        let reports = SyncExecutor::new(&remote).execute_batches(vec![
            vec![op(
                Some(&kollam),
                "Kollam",
                ChildChange::AddPanchayath("B".to_string()),
            )],
            vec![op(
                Some(&idukki),
                "Idukki",
                ChildChange::AddPanchayath("Y".to_string()),
            )],
        ]);

        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_complete_success());
        assert!(reports[1].is_total_failure());
        assert_ne!(reports[0].session_id, reports[1].session_id);
    }
}
