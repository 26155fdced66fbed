//! Step handlers.
//!
//! Each handler implements one step's semantics; everything shared (config
//! merge, state load, precondition, persistence, audit, metrics, dispatch)
//! lives in the runner.

mod archive_snapshot;
mod check_copy_status;
mod check_delete_status;
mod check_restore_status;
mod cleanup;
mod copy_snapshot;
mod delete_rds;
mod restore_snapshot;
mod setup_db_users;
mod snapshot_check;
mod sns_notification;
mod verify_restore;

pub use archive_snapshot::ArchiveSnapshotHandler;
pub use check_copy_status::CheckCopyStatusHandler;
pub use check_delete_status::CheckDeleteStatusHandler;
pub use check_restore_status::CheckRestoreStatusHandler;
pub use cleanup::CleanupHandler;
pub use copy_snapshot::CopySnapshotHandler;
pub use delete_rds::DeleteRdsHandler;
pub use restore_snapshot::RestoreSnapshotHandler;
pub use setup_db_users::SetupDbUsersHandler;
pub use snapshot_check::SnapshotCheckHandler;
pub use sns_notification::SnsNotificationHandler;
pub use verify_restore::VerifyRestoreHandler;
