//! SNS notifier.

use std::sync::Arc;

use async_trait::async_trait;

use aurora_engine::ports::{CloudError, CloudErrorKind, Notifier};

use crate::classify::classify_error;
use crate::clients::AwsClients;
use crate::retry::with_backoff;

/// Publishes operator notifications. Topics are regional, so the client
/// region is taken from the topic ARN.
pub struct SnsNotifier {
    clients: Arc<AwsClients>,
}

impl SnsNotifier {
    pub fn new(clients: Arc<AwsClients>) -> Self {
        Self { clients }
    }
}

/// Region segment of an ARN (`arn:aws:sns:REGION:account:topic`).
fn region_of_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(3).filter(|region| !region.is_empty())
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, CloudError> {
        let region = region_of_arn(topic_arn).ok_or_else(|| {
            CloudError::new(
                CloudErrorKind::InvalidParameter,
                format!("topic arn has no region: {topic_arn}"),
            )
        })?;
        let client = self.clients.sns(region).await;

        let output = with_backoff("sns_publish", || {
            let client = client.clone();
            async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .subject(subject)
                    .message(message)
                    .send()
                    .await
                    .map_err(|err| classify_error("sns_publish", err))
            }
        })
        .await?;

        Ok(output.message_id().unwrap_or_default().to_string())
    }
}
