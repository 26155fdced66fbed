//! Metric sinks.

use async_trait::async_trait;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};
use aws_sdk_cloudwatch::Client;
use parking_lot::RwLock;

use aurora_types::{Metric, MetricUnit, METRIC_NAMESPACE};

use crate::{ObservabilityError, Result};

/// Trait for metric sinks.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Publish one metric datum.
    async fn emit(&self, metric: &Metric) -> Result<()>;
}

/// In-memory metric sink for testing.
#[derive(Default)]
pub struct MemoryMetricsSink {
    metrics: RwLock<Vec<Metric>>,
}

impl MemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All emitted metrics.
    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics.read().clone()
    }

    /// Sum of values emitted under a metric name.
    pub fn total(&self, name: &str) -> f64 {
        self.metrics
            .read()
            .iter()
            .filter(|m| m.name == name)
            .map(|m| m.value)
            .sum()
    }
}

#[async_trait]
impl MetricsSink for MemoryMetricsSink {
    async fn emit(&self, metric: &Metric) -> Result<()> {
        self.metrics.write().push(metric.clone());
        Ok(())
    }
}

/// CloudWatch metric sink publishing under the `AuroraRestore` namespace,
/// dimensioned by operation id and environment.
#[derive(Clone)]
pub struct CloudWatchMetricsSink {
    client: Client,
}

impl CloudWatchMetricsSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsSink for CloudWatchMetricsSink {
    async fn emit(&self, metric: &Metric) -> Result<()> {
        let unit = match metric.unit {
            MetricUnit::Count => StandardUnit::Count,
            MetricUnit::Seconds => StandardUnit::Seconds,
        };
        let datum = MetricDatum::builder()
            .metric_name(&metric.name)
            .value(metric.value)
            .unit(unit)
            .dimensions(
                Dimension::builder()
                    .name("OperationId")
                    .value(metric.operation_id.as_str())
                    .build(),
            )
            .dimensions(
                Dimension::builder()
                    .name("Environment")
                    .value(&metric.environment)
                    .build(),
            )
            .build();
        self.client
            .put_metric_data()
            .namespace(METRIC_NAMESPACE)
            .metric_data(datum)
            .send()
            .await
            .map_err(|err| ObservabilityError::Sink(err.to_string()))?;
        Ok(())
    }
}
