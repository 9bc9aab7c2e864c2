//! Core reconciliation logic for the district location registry.
//! This crate owns the local registry and every invariant about syncing it
//! with the admin backend.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{ClientConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::district::{ChildKind, District, DistrictId};
pub use model::draft::DistrictDraft;
pub use model::operation::{ChildChange, DistrictRef, Operation};
pub use model::validation::{
    AcceptAll, ChildValueValidator, DistrictValidationError, PincodeFormatValidator,
};
pub use repo::registry::{LocationRegistry, RegistryError, RegistryResult};
pub use service::bulk_create::{plan_creation, CreationBatch};
pub use service::diff_engine::{compute_creation_plan, compute_plan, ReconciliationPlan};
pub use service::district_service::{
    DistrictSyncService, PreparedEdit, SyncServiceError, SyncServiceResult,
};
pub use service::reconciler::{FailedChange, LocalStateReconciler, OutcomeStatus, SyncOutcome};
pub use sync::executor::{ExecutionReport, FailedOperation, SyncExecutor};
pub use sync::http_remote::HttpDistrictRemote;
pub use sync::memory_remote::{InMemoryDistrictRemote, RemoteCall};
pub use sync::remote::{DistrictRemote, RemoteAck, RemoteError, RemoteResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
