//! SQS step dispatcher.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use aurora_engine::ports::{CloudError, DispatchRequest, StepDispatcher};

use crate::classify::classify_error;
use crate::retry::with_backoff;

/// SQS caps DelaySeconds at 15 minutes.
const MAX_DELAY_SECS: u64 = 900;

/// Dispatches steps onto an SQS queue drained by the step workers. The
/// optional dispatch delay maps onto `DelaySeconds`, which gives polling
/// loops their pacing; delivery is at-least-once by the queue's nature.
pub struct SqsStepDispatcher {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsStepDispatcher {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

/// Queue message body: the step to invoke and its event payload.
fn message_body(request: &DispatchRequest) -> String {
    json!({
        "step": request.step,
        "operation_id": request.operation_id,
        "payload": request.payload,
    })
    .to_string()
}

#[async_trait]
impl StepDispatcher for SqsStepDispatcher {
    async fn dispatch(&self, request: DispatchRequest) -> Result<(), CloudError> {
        let body = message_body(&request);
        let delay = request
            .delay
            .map(|d| d.as_secs().min(MAX_DELAY_SECS) as i32);
        debug!(
            operation_id = %request.operation_id,
            step = %request.step,
            delay_secs = delay.unwrap_or(0),
            "dispatching step"
        );

        with_backoff("sqs_send_message", || {
            let client = self.client.clone();
            let body = body.clone();
            async move {
                client
                    .send_message()
                    .queue_url(&self.queue_url)
                    .message_body(body)
                    .set_delay_seconds(delay)
                    .send()
                    .await
                    .map_err(|err| classify_error("sqs_send_message", err))
            }
        })
        .await?;
        Ok(())
    }
}
