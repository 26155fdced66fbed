//! Handler registry for the workflow chain.

use aurora_types::StepName;

use crate::handlers;
use crate::StepHandler;

/// Handler for a step. Handlers are stateless, so a fresh box per
/// invocation is cheap.
pub fn handler_for(step: StepName) -> Box<dyn StepHandler> {
    match step {
        StepName::SnapshotCheck => Box::new(handlers::SnapshotCheckHandler),
        StepName::CopySnapshot => Box::new(handlers::CopySnapshotHandler),
        StepName::CheckCopyStatus => Box::new(handlers::CheckCopyStatusHandler),
        StepName::DeleteRds => Box::new(handlers::DeleteRdsHandler),
        StepName::CheckDeleteStatus => Box::new(handlers::CheckDeleteStatusHandler),
        StepName::RestoreSnapshot => Box::new(handlers::RestoreSnapshotHandler),
        StepName::CheckRestoreStatus => Box::new(handlers::CheckRestoreStatusHandler),
        StepName::SetupDbUsers => Box::new(handlers::SetupDbUsersHandler),
        StepName::VerifyRestore => Box::new(handlers::VerifyRestoreHandler),
        StepName::ArchiveSnapshot => Box::new(handlers::ArchiveSnapshotHandler),
        StepName::SnsNotification => Box::new(handlers::SnsNotificationHandler),
        StepName::Cleanup => Box::new(handlers::CleanupHandler),
    }
}
