//! Adapter ports.
//!
//! The engine reaches every collaborator through the narrow traits in this
//! module. Concrete implementations live in `aurora-cloud` (AWS SDK) and
//! `aurora-db` (sqlx); tests script them in memory.

mod clock;
mod cloud;
mod db;
mod dispatch;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cloud::{
    CloudError, CloudErrorKind, ClusterControl, ClusterInfo, CopySnapshotRequest, LogStore,
    Notifier, RestoreSpec, SecretsProvider, SnapshotInfo, SnapshotScope, SnapshotStore,
};
pub use db::{
    AppCredentials, ConnectTarget, DatabaseAdmin, DbAdminError, MasterCredentials, RoleAccess,
    RoleSpec, VerificationSummary,
};
pub use dispatch::{DispatchRequest, StepDispatcher};
