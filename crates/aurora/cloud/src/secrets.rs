//! Secrets Manager credential provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use aurora_engine::ports::{
    AppCredentials, CloudError, CloudErrorKind, MasterCredentials, SecretsProvider,
};

use crate::classify::classify_error;
use crate::clients::AwsClients;
use crate::retry::with_backoff;

/// Reads credential secrets as JSON documents.
pub struct SecretsManagerProvider {
    clients: Arc<AwsClients>,
}

impl SecretsManagerProvider {
    pub fn new(clients: Arc<AwsClients>) -> Self {
        Self { clients }
    }

    async fn secret_json(&self, region: &str, secret_id: &str) -> Result<Value, CloudError> {
        let client = self.clients.secretsmanager(region).await;
        let output = with_backoff("get_secret_value", || {
            let client = client.clone();
            async move {
                client
                    .get_secret_value()
                    .secret_id(secret_id)
                    .send()
                    .await
                    .map_err(|err| classify_error("get_secret_value", err))
            }
        })
        .await?;

        let raw = output.secret_string().ok_or_else(|| {
            CloudError::new(
                CloudErrorKind::InvalidParameter,
                format!("secret {secret_id} has no string value"),
            )
        })?;
        serde_json::from_str(raw).map_err(|err| {
            CloudError::new(
                CloudErrorKind::InvalidParameter,
                format!("secret {secret_id} is not valid JSON: {err}"),
            )
        })
    }
}

#[async_trait]
impl SecretsProvider for SecretsManagerProvider {
    async fn master_credentials(
        &self,
        region: &str,
        secret_id: &str,
    ) -> Result<MasterCredentials, CloudError> {
        let value = self.secret_json(region, secret_id).await?;
        MasterCredentials::from_json(&value)
    }

    async fn app_credentials(
        &self,
        region: &str,
        secret_id: &str,
    ) -> Result<AppCredentials, CloudError> {
        let value = self.secret_json(region, secret_id).await?;
        AppCredentials::from_json(&value)
    }
}
