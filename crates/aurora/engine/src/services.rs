//! Collaborator bundle handed to every step.

use std::sync::Arc;

use aurora_config::ParameterSource;
use aurora_observability::{AuditSink, MetricsSink};
use aurora_state::StateStore;

use crate::ports::{
    Clock, ClusterControl, DatabaseAdmin, LogStore, Notifier, SecretsProvider, SnapshotStore,
    StepDispatcher,
};

/// The engine's collaborators, all behind narrow traits so handlers stay
/// SDK-free and tests can script every seam. Constructed once per
/// invocation context and shared by reference; nothing here holds
/// cross-handler mutable state.
#[derive(Clone)]
pub struct EngineServices {
    pub clock: Arc<dyn Clock>,
    pub state: Arc<dyn StateStore>,
    pub audit: Arc<dyn AuditSink>,
    pub metrics: Arc<dyn MetricsSink>,
    /// Parameter store source for the config resolver; `None` skips that
    /// layer (local runs, tests).
    pub parameters: Option<Arc<dyn ParameterSource>>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub clusters: Arc<dyn ClusterControl>,
    pub secrets: Arc<dyn SecretsProvider>,
    pub notifier: Arc<dyn Notifier>,
    /// Log store for administrative cleanup; `None` disables log deletion.
    pub logs: Option<Arc<dyn LogStore>>,
    pub database: Arc<dyn DatabaseAdmin>,
    pub dispatcher: Arc<dyn StepDispatcher>,
    /// Deployment environment (`dev`, `test`, `prod`); tags audit rows and
    /// metric dimensions and selects the parameter-store path.
    pub environment: String,
}
