//! SSM parameter source for the config resolver.

use async_trait::async_trait;

use aurora_config::{ConfigError, ParameterSource};

/// Reads configuration documents from the SSM Parameter Store.
pub struct SsmParameterSource {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterSource {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterSource for SsmParameterSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, ConfigError> {
        match self
            .client
            .get_parameter()
            .name(path)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(output) => Ok(output
                .parameter()
                .and_then(|parameter| parameter.value())
                .map(str::to_string)),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_parameter_not_found() {
                    Ok(None)
                } else {
                    Err(ConfigError::ParameterStore(service_err.to_string()))
                }
            }
        }
    }
}
