//! The five-source configuration resolver.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use aurora_types::validate::{validate_cluster_id, validate_region, validate_security_group_id};
use aurora_types::{StepEvent, StepName, StepRecord};

use crate::keys::{BOOL_KEYS, INT_KEYS, KNOWN_KEYS};
use crate::{ConfigError, ConfigSource, Result};

const TRUE_WORDS: &[&str] = &["true", "1", "yes", "y"];

/// Read access to the parameter store, behind a narrow seam so the resolver
/// does not depend on any SDK.
#[async_trait]
pub trait ParameterSource: Send + Sync {
    /// Fetch a parameter by full path. `Ok(None)` means the parameter does
    /// not exist, which is not an error.
    async fn fetch(&self, path: &str) -> Result<Option<String>>;
}

/// Merges configuration values from defaults, parameter store, environment,
/// persisted state, and the event payload, tracking each value's source.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    values: BTreeMap<&'static str, Value>,
    sources: BTreeMap<&'static str, ConfigSource>,
}

impl ConfigResolver {
    /// Seed the resolver with built-in defaults for the given environment.
    pub fn new(environment: impl Into<String>) -> Self {
        let environment = environment.into();
        let mut resolver = Self {
            values: BTreeMap::new(),
            sources: BTreeMap::new(),
        };
        for (key, value) in defaults(&environment) {
            resolver.values.insert(key, value);
            resolver.sources.insert(key, ConfigSource::Default);
        }
        resolver
    }

    /// Merge the parameter-store config document
    /// (`/{parameter_prefix}/{environment}/config`, JSON object).
    ///
    /// Best-effort: unavailability or a malformed document logs a warning
    /// and leaves lower-priority values in place.
    pub async fn load_parameter_store(&mut self, source: &dyn ParameterSource) {
        let path = format!("/{}/{}/config", self.str_value("parameter_prefix"), self.environment());
        match source.fetch(&path).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(doc)) => {
                    for (key, value) in doc {
                        self.set(&key, value, ConfigSource::ParameterStore);
                    }
                    debug!(path = %path, "loaded configuration from parameter store");
                }
                Ok(_) => warn!(path = %path, "parameter store config is not a JSON object"),
                Err(err) => warn!(path = %path, error = %err, "parameter store config is not valid JSON"),
            },
            Ok(None) => debug!(path = %path, "no parameter store config found"),
            Err(err) => warn!(path = %path, error = %err, "failed to load parameter store config"),
        }
    }

    /// Merge configuration from process environment variables
    /// (`SOURCE_REGION` → `source_region`, …).
    pub fn load_env(&mut self) {
        self.load_env_from(std::env::vars());
    }

    /// Merge configuration from an explicit variable set. Split out from
    /// [`Self::load_env`] so tests do not have to mutate the process
    /// environment.
    pub fn load_env_from(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        for key in KNOWN_KEYS {
            if let Some(value) = vars.get(&key.to_ascii_uppercase()) {
                self.set(key, Value::String(value.clone()), ConfigSource::Environment);
            }
        }
    }

    /// Merge configuration keys carried in the latest step record.
    pub fn load_state(&mut self, record: &StepRecord) {
        for (key, value) in &record.fields {
            self.set(key, value.clone(), ConfigSource::State);
        }
    }

    /// Merge configuration keys carried in the event payload (highest
    /// priority).
    pub fn load_event(&mut self, event: &StepEvent) {
        for (key, value) in &event.extra {
            self.set(key, value.clone(), ConfigSource::Event);
        }
    }

    /// Insert a value with coercion; unknown keys are ignored, coercion
    /// failures keep the prior value.
    fn set(&mut self, key: &str, value: Value, source: ConfigSource) {
        let Some(key) = KNOWN_KEYS.iter().copied().find(|k| *k == key) else {
            return;
        };
        let coerced = if INT_KEYS.contains(&key) {
            coerce_int(key, value)
        } else if BOOL_KEYS.contains(&key) {
            coerce_bool(key, value)
        } else {
            Some(value)
        };
        if let Some(value) = coerced {
            self.values.insert(key, value);
            self.sources.insert(key, source);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String view of a key; absent or non-string values read as empty.
    pub fn str_value(&self, key: &str) -> &str {
        self.values.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn environment(&self) -> &str {
        self.str_value("environment")
    }

    /// Where each key's current value came from.
    pub fn sources(&self) -> &BTreeMap<&'static str, ConfigSource> {
        &self.sources
    }

    /// Validate the required-key matrix and identifier formats for a step.
    pub fn validate_for(&self, step: StepName) -> Result<()> {
        for key in required_keys(step).iter().copied() {
            let value = self.require(step, key)?;
            match key {
                "source_region" | "target_region" => {
                    validate_region(value).map_err(|err| invalid(key, value, err))?
                }
                "source_cluster_id" | "target_cluster_id" => {
                    validate_cluster_id(value).map_err(|err| invalid(key, value, err))?
                }
                _ => {}
            }
        }
        if step == StepName::RestoreSnapshot {
            let port = self.get("port").and_then(Value::as_i64).unwrap_or(0);
            if !(1..=65535).contains(&port) {
                return Err(ConfigError::InvalidValue {
                    key: "port",
                    value: port.to_string(),
                    reason: "must be in 1..65535".to_string(),
                });
            }
            for sg in self
                .str_value("vpc_security_group_ids")
                .split(',')
                .map(str::trim)
                .filter(|sg| !sg.is_empty())
            {
                validate_security_group_id(sg)
                    .map_err(|err| invalid("vpc_security_group_ids", sg, err))?;
            }
        }
        Ok(())
    }

    fn require(&self, step: StepName, key: &'static str) -> Result<&str> {
        match self.values.get(key).and_then(Value::as_str) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingRequired { step, key }),
        }
    }
}

fn invalid(key: &'static str, value: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    }
}

fn coerce_int(key: &str, value: Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(n) => Some(Value::from(n)),
            Err(_) => {
                warn!(key, value = %s, "could not coerce to integer, keeping prior value");
                None
            }
        },
        other => {
            warn!(key, value = %other, "unexpected type for integer key, keeping prior value");
            None
        }
    }
}

fn coerce_bool(key: &str, value: Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value),
        Value::String(s) => Some(Value::Bool(
            TRUE_WORDS.contains(&s.trim().to_ascii_lowercase().as_str()),
        )),
        other => {
            warn!(key, value = %other, "unexpected type for boolean key, keeping prior value");
            None
        }
    }
}

/// String keys that must be present and non-empty for a step to run.
fn required_keys(step: StepName) -> &'static [&'static str] {
    match step {
        StepName::SnapshotCheck => &[
            "source_region",
            "target_region",
            "source_cluster_id",
            "target_cluster_id",
            "snapshot_prefix",
        ],
        StepName::CopySnapshot | StepName::CheckCopyStatus | StepName::ArchiveSnapshot => {
            &["source_region", "target_region"]
        }
        StepName::DeleteRds
        | StepName::CheckDeleteStatus
        | StepName::RestoreSnapshot
        | StepName::CheckRestoreStatus => &["source_region", "target_region", "target_cluster_id"],
        StepName::SetupDbUsers => &[
            "source_region",
            "target_region",
            "target_cluster_id",
            "master_credentials_secret_id",
            "app_credentials_secret_id",
        ],
        StepName::VerifyRestore => &[
            "source_region",
            "target_region",
            "target_cluster_id",
            "master_credentials_secret_id",
        ],
        StepName::SnsNotification => &[
            "source_region",
            "target_region",
            "target_cluster_id",
            "sns_topic_arn",
        ],
        StepName::Cleanup => &["target_region", "target_cluster_id"],
    }
}

fn defaults(environment: &str) -> Vec<(&'static str, Value)> {
    vec![
        ("source_region", Value::String(String::new())),
        ("target_region", Value::String(String::new())),
        ("source_cluster_id", Value::String(String::new())),
        ("target_cluster_id", Value::String(String::new())),
        ("snapshot_prefix", Value::from("aurora-snapshot")),
        ("vpc_security_group_ids", Value::String(String::new())),
        ("db_subnet_group_name", Value::String(String::new())),
        ("availability_zones", Value::String(String::new())),
        ("db_cluster_parameter_group_name", Value::String(String::new())),
        ("kms_key_id", Value::String(String::new())),
        (
            "master_credentials_secret_id",
            Value::from("aurora-restore/master-db-credentials"),
        ),
        (
            "app_credentials_secret_id",
            Value::from("aurora-restore/app-db-credentials"),
        ),
        ("copy_status_retry_delay", Value::from(60)),
        ("restore_status_retry_delay", Value::from(60)),
        ("delete_status_retry_delay", Value::from(60)),
        ("max_copy_attempts", Value::from(60)),
        ("copy_check_interval", Value::from(30)),
        ("max_restore_attempts", Value::from(60)),
        ("restore_check_interval", Value::from(30)),
        ("skip_final_snapshot", Value::Bool(true)),
        ("deletion_protection", Value::Bool(false)),
        ("archive_snapshot", Value::Bool(true)),
        ("port", Value::from(5432)),
        ("db_connection_timeout", Value::from(30)),
        ("sns_topic_arn", Value::String(String::new())),
        ("state_table_name", Value::from("aurora-restore-state")),
        ("audit_table_name", Value::from("aurora-restore-audit")),
        ("environment", Value::from(environment)),
        ("log_level", Value::from("INFO")),
        ("log_bucket", Value::String(String::new())),
        ("log_prefix", Value::from("aurora-restore-logs")),
        ("cleanup_snapshot", Value::Bool(true)),
        ("cleanup_state_data", Value::Bool(true)),
        ("cleanup_logs", Value::Bool(true)),
        ("parameter_prefix", Value::from("aurora-restore")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_types::OperationId;
    use serde_json::json;

    struct StaticParams(Option<String>);

    #[async_trait]
    impl ParameterSource for StaticParams {
        async fn fetch(&self, _path: &str) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_seeded() {
        let resolver = ConfigResolver::new("dev");
        assert_eq!(resolver.str_value("snapshot_prefix"), "aurora-snapshot");
        assert_eq!(resolver.get("port").unwrap(), &json!(5432));
        assert_eq!(resolver.sources()["port"], ConfigSource::Default);
    }

    #[test]
    fn test_priority_event_beats_env() {
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_env_from(env(&[("TARGET_REGION", "us-west-2")]));
        let event: StepEvent =
            serde_json::from_value(json!({"target_region": "eu-west-1"})).unwrap();
        resolver.load_event(&event);
        assert_eq!(resolver.str_value("target_region"), "eu-west-1");
        assert_eq!(resolver.sources()["target_region"], ConfigSource::Event);
    }

    #[tokio::test]
    async fn test_parameter_store_layer() {
        let mut resolver = ConfigResolver::new("prod");
        let params = StaticParams(Some(
            json!({"source_region": "us-east-1", "port": 6432, "ignored_key": "x"}).to_string(),
        ));
        resolver.load_parameter_store(&params).await;
        assert_eq!(resolver.str_value("source_region"), "us-east-1");
        assert_eq!(resolver.get("port").unwrap(), &json!(6432));
        assert!(resolver.get("ignored_key").is_none());
        assert_eq!(resolver.sources()["port"], ConfigSource::ParameterStore);
    }

    #[tokio::test]
    async fn test_parameter_store_unavailable_keeps_defaults() {
        struct Failing;
        #[async_trait]
        impl ParameterSource for Failing {
            async fn fetch(&self, _path: &str) -> Result<Option<String>> {
                Err(ConfigError::ParameterStore("timed out".into()))
            }
        }
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_parameter_store(&Failing).await;
        assert_eq!(resolver.str_value("snapshot_prefix"), "aurora-snapshot");
    }

    #[test]
    fn test_int_coercion_failure_keeps_prior() {
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_env_from(env(&[("PORT", "abc")]));
        // Default retained, source unchanged.
        assert_eq!(resolver.get("port").unwrap(), &json!(5432));
        assert_eq!(resolver.sources()["port"], ConfigSource::Default);
    }

    #[test]
    fn test_bool_coercion_spellings() {
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_env_from(env(&[("DELETION_PROTECTION", "Yes")]));
        assert_eq!(resolver.get("deletion_protection").unwrap(), &json!(true));
        resolver.load_env_from(env(&[("DELETION_PROTECTION", "off")]));
        assert_eq!(resolver.get("deletion_protection").unwrap(), &json!(false));
    }

    #[test]
    fn test_state_layer_merges_known_keys_only() {
        let mut resolver = ConfigResolver::new("dev");
        let record = StepRecord::success(OperationId::new("op-1-a"), StepName::SnapshotCheck, 1)
            .with("target_region", "eu-west-1")
            .with("snapshot_name", "not-a-config-key");
        resolver.load_state(&record);
        assert_eq!(resolver.str_value("target_region"), "eu-west-1");
        assert!(resolver.get("snapshot_name").is_none());
    }

    #[test]
    fn test_validate_for_missing_key() {
        let resolver = ConfigResolver::new("dev");
        let err = resolver.validate_for(StepName::SnapshotCheck).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn test_validate_for_bad_region_format() {
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_env_from(env(&[
            ("SOURCE_REGION", "nowhere"),
            ("TARGET_REGION", "eu-west-1"),
            ("SOURCE_CLUSTER_ID", "prod-db"),
            ("TARGET_CLUSTER_ID", "prod-db-restored"),
        ]));
        let err = resolver.validate_for(StepName::SnapshotCheck).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "source_region", .. }));
    }

    #[test]
    fn test_validate_port_range() {
        let mut resolver = ConfigResolver::new("dev");
        resolver.load_env_from(env(&[
            ("SOURCE_REGION", "us-east-1"),
            ("TARGET_REGION", "eu-west-1"),
            ("TARGET_CLUSTER_ID", "prod-db-restored"),
            ("PORT", "70000"),
        ]));
        let err = resolver.validate_for(StepName::RestoreSnapshot).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "port", .. }));
    }
}
