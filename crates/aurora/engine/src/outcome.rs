//! Step outcomes.

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

use aurora_types::{AuditStatus, StepName};

/// What happens after a step completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Dispatch the successor step, optionally after a delay.
    Advance {
        step: StepName,
        delay: Option<Duration>,
    },
    /// Re-dispatch this step after a delay (polling in progress).
    Requeue { delay: Duration },
    /// The chain ends here.
    Terminal,
}

/// A successful step outcome: the payload fields to persist and carry
/// forward, the audit status, and the next action for the chain.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub message: String,
    pub fields: Map<String, Value>,
    pub audit_status: AuditStatus,
    pub next: NextAction,
    /// Whether the runner persists a step record for this outcome. Only
    /// administrative cleanup opts out (it just deleted those rows).
    pub persist_record: bool,
}

impl StepOutcome {
    fn new(message: impl Into<String>, audit_status: AuditStatus, next: NextAction) -> Self {
        Self {
            message: message.into(),
            fields: Map::new(),
            audit_status,
            next,
            persist_record: true,
        }
    }

    /// Completed; dispatch the successor immediately.
    pub fn advance(message: impl Into<String>, step: StepName) -> Self {
        Self::new(
            message,
            AuditStatus::Success,
            NextAction::Advance { step, delay: None },
        )
    }

    /// Completed; dispatch the successor after a delay.
    pub fn advance_after(message: impl Into<String>, step: StepName, delay: Duration) -> Self {
        Self::new(
            message,
            AuditStatus::Success,
            NextAction::Advance {
                step,
                delay: Some(delay),
            },
        )
    }

    /// The step's work was not required; dispatch the successor.
    pub fn skipped(message: impl Into<String>, step: StepName) -> Self {
        Self::new(
            message,
            AuditStatus::Skipped,
            NextAction::Advance { step, delay: None },
        )
    }

    /// Still converging; re-dispatch this step after a delay.
    pub fn waiting(message: impl Into<String>, delay: Duration) -> Self {
        Self::new(message, AuditStatus::Waiting, NextAction::Requeue { delay })
    }

    /// Completed; the chain ends here.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(message, AuditStatus::Success, NextAction::Terminal)
    }

    /// Attach a payload field. Unserializable values are dropped.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Skip the state write for this outcome.
    pub fn without_record(mut self) -> Self {
        self.persist_record = false;
        self
    }

    /// Whether the outcome reports in-progress polling (202) rather than
    /// completion (200).
    pub fn is_in_progress(&self) -> bool {
        matches!(self.next, NextAction::Requeue { .. })
    }
}
