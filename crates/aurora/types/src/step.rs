//! Workflow step names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The named steps of the restore workflow.
///
/// Eleven steps form the restore chain; `Cleanup` is administrative and
/// only ever invoked out-of-band by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    SnapshotCheck,
    CopySnapshot,
    CheckCopyStatus,
    DeleteRds,
    CheckDeleteStatus,
    RestoreSnapshot,
    CheckRestoreStatus,
    SetupDbUsers,
    VerifyRestore,
    ArchiveSnapshot,
    SnsNotification,
    Cleanup,
}

impl StepName {
    /// All steps, in canonical chain order (cleanup last, outside the chain).
    pub const ALL: [StepName; 12] = [
        StepName::SnapshotCheck,
        StepName::CopySnapshot,
        StepName::CheckCopyStatus,
        StepName::DeleteRds,
        StepName::CheckDeleteStatus,
        StepName::RestoreSnapshot,
        StepName::CheckRestoreStatus,
        StepName::SetupDbUsers,
        StepName::VerifyRestore,
        StepName::ArchiveSnapshot,
        StepName::SnsNotification,
        StepName::Cleanup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::SnapshotCheck => "snapshot_check",
            StepName::CopySnapshot => "copy_snapshot",
            StepName::CheckCopyStatus => "check_copy_status",
            StepName::DeleteRds => "delete_rds",
            StepName::CheckDeleteStatus => "check_delete_status",
            StepName::RestoreSnapshot => "restore_snapshot",
            StepName::CheckRestoreStatus => "check_restore_status",
            StepName::SetupDbUsers => "setup_db_users",
            StepName::VerifyRestore => "verify_restore",
            StepName::ArchiveSnapshot => "archive_snapshot",
            StepName::SnsNotification => "sns_notification",
            StepName::Cleanup => "cleanup",
        }
    }

    /// Whether this step probes a long-running cloud operation and may
    /// re-dispatch itself.
    pub fn is_polling(&self) -> bool {
        matches!(
            self,
            StepName::CheckCopyStatus | StepName::CheckDeleteStatus | StepName::CheckRestoreStatus
        )
    }

    /// Whether this step is the entry point of the chain and therefore
    /// tolerates absent prior state.
    pub fn is_entry(&self) -> bool {
        matches!(self, StepName::SnapshotCheck)
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| UnknownStep(s.to_string()))
    }
}

/// Error returned when parsing an unrecognized step name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown step: {0}")]
pub struct UnknownStep(pub String);
