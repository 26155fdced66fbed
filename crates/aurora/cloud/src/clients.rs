//! Per-region client factory.

use std::collections::HashMap;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::sync::Mutex;

/// Per-attempt timeout for control-plane calls (describe, copy, restore).
const CLOUD_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-attempt timeout for secret fetches.
const SECRET_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds AWS clients for arbitrary regions, memoizing the resolved SDK
/// configuration per region within one invocation. Constructed fresh per
/// invocation; holds no cross-handler state.
pub struct AwsClients {
    configs: Mutex<HashMap<String, SdkConfig>>,
}

fn attempt_timeout(timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .operation_attempt_timeout(timeout)
        .build()
}

impl AwsClients {
    pub fn new() -> Self {
        Self {
            configs: Mutex::new(HashMap::new()),
        }
    }

    async fn sdk_config(&self, region: &str) -> SdkConfig {
        let mut configs = self.configs.lock().await;
        if let Some(config) = configs.get(region) {
            return config.clone();
        }
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(attempt_timeout(CLOUD_CALL_TIMEOUT))
            .load()
            .await;
        configs.insert(region.to_string(), config.clone());
        config
    }

    pub async fn rds(&self, region: &str) -> aws_sdk_rds::Client {
        aws_sdk_rds::Client::new(&self.sdk_config(region).await)
    }

    pub async fn secretsmanager(&self, region: &str) -> aws_sdk_secretsmanager::Client {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config(region).await)
            .timeout_config(attempt_timeout(SECRET_FETCH_TIMEOUT))
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }

    pub async fn sns(&self, region: &str) -> aws_sdk_sns::Client {
        aws_sdk_sns::Client::new(&self.sdk_config(region).await)
    }
}

impl Default for AwsClients {
    fn default() -> Self {
        Self::new()
    }
}
