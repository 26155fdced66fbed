//! In-process dispatcher.
//!
//! Used by the CLI's local mode and by the integration tests: dispatch
//! requests go onto an unbounded queue, and a worker drains the queue
//! through the runner, honoring delays with timer sleeps (which the tokio
//! test clock fast-forwards).

use async_trait::async_trait;
use tokio::sync::mpsc;

use aurora_types::{StepEvent, StepResponse};

use crate::ports::{CloudError, DispatchRequest, StepDispatcher};
use crate::runner::StepRunner;

/// Sender half: implements [`StepDispatcher`] over an in-process queue.
#[derive(Clone)]
pub struct LocalDispatcher {
    tx: mpsc::UnboundedSender<DispatchRequest>,
}

/// Receiver half: drains queued dispatches through a runner.
pub struct LocalWorker {
    rx: mpsc::UnboundedReceiver<DispatchRequest>,
}

impl LocalDispatcher {
    /// Create a connected dispatcher/worker pair.
    pub fn channel() -> (Self, LocalWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, LocalWorker { rx })
    }
}

#[async_trait]
impl StepDispatcher for LocalDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<(), CloudError> {
        self.tx
            .send(request)
            .map_err(|err| CloudError::other(format!("local dispatch queue closed: {err}")))
    }
}

impl LocalWorker {
    /// Execute queued dispatches until the queue is idle, returning the
    /// response of every executed step in order.
    pub async fn drive(&mut self, runner: &StepRunner) -> Vec<StepResponse> {
        let mut responses = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            if let Some(delay) = request.delay {
                tokio::time::sleep(delay).await;
            }
            let mut event = StepEvent::from_fields(request.payload);
            event.operation_id = Some(request.operation_id.to_string());
            responses.push(runner.execute(request.step, event).await);
        }
        responses
    }

    /// Take the next queued request without executing it.
    pub fn try_next(&mut self) -> Option<DispatchRequest> {
        self.rx.try_recv().ok()
    }
}
