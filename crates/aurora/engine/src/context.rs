//! Per-invocation step context.

use serde_json::Value;

use aurora_config::RestoreConfig;
use aurora_types::{OperationId, StepEvent, StepRecord};

use crate::StepError;

/// Everything a handler needs for one invocation: the resolved operation
/// id and configuration, the incoming event, and the latest persisted
/// record for the operation.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub operation_id: OperationId,
    pub config: RestoreConfig,
    pub event: StepEvent,
    pub prior: Option<StepRecord>,
}

impl StepContext {
    /// Resolve a value carried from the previous step: the event payload
    /// wins, the latest record is the fallback.
    pub fn carried(&self, key: &str) -> Option<&Value> {
        self.event
            .field(key)
            .or_else(|| self.prior.as_ref().and_then(|record| record.fields.get(key)))
    }

    pub fn carried_str(&self, key: &str) -> Option<&str> {
        self.carried(key).and_then(Value::as_str)
    }

    pub fn carried_i64(&self, key: &str) -> Option<i64> {
        self.carried(key).and_then(Value::as_i64)
    }

    /// A carried value the step cannot run without.
    pub fn require_carried(&self, key: &str) -> Result<String, StepError> {
        self.carried_str(key)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StepError::Validation(format!("missing required input: {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_config::ConfigResolver;
    use aurora_types::StepName;
    use serde_json::json;

    fn context() -> StepContext {
        let event: StepEvent =
            serde_json::from_value(json!({"target_snapshot_name": "from-event"})).unwrap();
        let prior = StepRecord::success(OperationId::new("op-1-a"), StepName::CopySnapshot, 1)
            .with("target_snapshot_name", "from-state")
            .with("copy_status", "copying");
        StepContext {
            operation_id: OperationId::new("op-1-a"),
            config: RestoreConfig::from_resolver(&ConfigResolver::new("dev")),
            event,
            prior: Some(prior),
        }
    }

    #[test]
    fn test_event_wins_over_state() {
        let ctx = context();
        assert_eq!(ctx.carried_str("target_snapshot_name"), Some("from-event"));
        assert_eq!(ctx.carried_str("copy_status"), Some("copying"));
    }

    #[test]
    fn test_require_carried_missing() {
        let ctx = context();
        assert!(matches!(
            ctx.require_carried("cluster_endpoint"),
            Err(StepError::Validation(_))
        ));
    }
}
