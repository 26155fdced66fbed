//! Orchestration engine for the Aurora restore pipeline.
//!
//! The engine is a step-based workflow with persistent state: each step is a
//! short-lived invocation that resolves configuration, loads the latest
//! persisted record for its operation, performs its action through narrow
//! adapter ports, persists its outcome, and dispatches the next step. The
//! three status-check steps are polling state machines that re-dispatch
//! themselves with a delay until the cloud-side operation converges.
//!
//! Handlers are idempotent: delivery is at-least-once, so every mutating
//! step begins with a pre-existence check and re-running a completed step
//! converges to the same record without duplicating cloud-side resources.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod chain;
mod context;
mod dispatch_local;
mod error;
pub mod handlers;
mod outcome;
pub mod poll;
pub mod ports;
mod runner;
mod services;

pub use context::StepContext;
pub use dispatch_local::{LocalDispatcher, LocalWorker};
pub use error::StepError;
pub use outcome::{NextAction, StepOutcome};
pub use runner::StepRunner;
pub use services::EngineServices;

use async_trait::async_trait;
use aurora_types::StepName;

/// One step of the workflow: validates its inputs and performs its action,
/// returning the outcome the shared runner persists and acts on.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// The step this handler implements.
    fn step(&self) -> StepName;

    /// Execute the step body. Expected conditions (absent artifacts during
    /// polling, already-existing targets) are outcomes, not errors; `Err`
    /// is reserved for conditions that fail the step.
    async fn run(
        &self,
        ctx: &StepContext,
        services: &EngineServices,
    ) -> Result<StepOutcome, StepError>;
}
