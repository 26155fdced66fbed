//! Retry with exponential backoff for transient cloud errors.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use aurora_engine::ports::CloudError;

const MAX_ATTEMPTS: u32 = 10;
const BASE_DELAY: Duration = Duration::from_secs(4);
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Run a call, retrying transient failures (throttling, timeouts, service
/// unavailability) with exponential backoff: 4 s doubling to a 60 s cap,
/// at most 10 attempts. Non-transient errors return immediately.
pub(crate) async fn with_backoff<T, F, Fut>(operation: &str, mut call: F) -> Result<T, CloudError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CloudError>>,
{
    let mut delay = BASE_DELAY;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(
                    operation,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "transient cloud error, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => return Err(err),
        }
    }
}
