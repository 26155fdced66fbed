//! Numeric metric emission shapes.

use serde::{Deserialize, Serialize};

use crate::OperationId;

/// Namespace under which all pipeline metrics are published.
pub const METRIC_NAMESPACE: &str = "AuroraRestore";

/// Unit of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Count,
    Seconds,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Count => "Count",
            MetricUnit::Seconds => "Seconds",
        }
    }
}

/// One metric datum, dimensioned by operation and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub operation_id: OperationId,
    pub environment: String,
}

impl Metric {
    pub fn count(
        operation_id: OperationId,
        environment: impl Into<String>,
        name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: MetricUnit::Count,
            operation_id,
            environment: environment.into(),
        }
    }

    pub fn seconds(
        operation_id: OperationId,
        environment: impl Into<String>,
        name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: MetricUnit::Seconds,
            operation_id,
            environment: environment.into(),
        }
    }
}
