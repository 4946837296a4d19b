use crate::error::Result;
use crate::params::ResolvedAlarmParameters;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cwguard_common::Dimension;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Provisioning boundary: receives one resolved alarm per call. Failures are
/// reported to the caller, never retried here.
#[async_trait]
pub trait AlarmSink: Send + Sync {
    fn name(&self) -> &str;

    async fn submit(&self, alarm: &ResolvedAlarmParameters) -> Result<()>;
}

/// A metric as returned by metric listing: namespace, name and the full
/// dimension set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDescriptor {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
}

/// Read access to published metrics, used by core hooks that expand one rule
/// into an alarm per discovered metric.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Metrics recently active (last three hours) under `namespace` and
    /// `metric_name` whose dimensions include every entry of `filter`.
    async fn list_metrics(
        &self,
        namespace: &str,
        metric_name: &str,
        filter: &[Dimension],
    ) -> Result<Vec<MetricDescriptor>>;

    /// Timestamp of the most recent datapoint of each metric over the last
    /// three hours, index-aligned with `metrics`.
    async fn latest_datapoints(
        &self,
        metrics: &[MetricDescriptor],
    ) -> Result<Vec<Option<DateTime<Utc>>>>;
}

/// Sink that keeps every submitted alarm in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    submitted: Mutex<Vec<ResolvedAlarmParameters>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<ResolvedAlarmParameters> {
        self.submitted
            .lock()
            .map(|alarms| alarms.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.submitted()
            .into_iter()
            .map(|alarm| alarm.alarm_name)
            .collect()
    }
}

#[async_trait]
impl AlarmSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn submit(&self, alarm: &ResolvedAlarmParameters) -> Result<()> {
        if let Ok(mut alarms) = self.submitted.lock() {
            alarms.push(alarm.clone());
        }
        Ok(())
    }
}

/// Fixed metric listing with fixed latest-datapoint timestamps.
#[derive(Debug, Default, Clone)]
pub struct StaticMetricSource {
    metrics: Vec<(MetricDescriptor, Option<DateTime<Utc>>)>,
}

impl StaticMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: MetricDescriptor, latest: Option<DateTime<Utc>>) -> Self {
        self.metrics.push((metric, latest));
        self
    }
}

#[async_trait]
impl MetricSource for StaticMetricSource {
    async fn list_metrics(
        &self,
        namespace: &str,
        metric_name: &str,
        filter: &[Dimension],
    ) -> Result<Vec<MetricDescriptor>> {
        Ok(self
            .metrics
            .iter()
            .map(|(metric, _)| metric)
            .filter(|m| m.namespace == namespace && m.metric_name == metric_name)
            .filter(|m| filter.iter().all(|f| m.dimensions.contains(f)))
            .cloned()
            .collect())
    }

    async fn latest_datapoints(
        &self,
        metrics: &[MetricDescriptor],
    ) -> Result<Vec<Option<DateTime<Utc>>>> {
        Ok(metrics
            .iter()
            .map(|wanted| {
                self.metrics
                    .iter()
                    .find(|(metric, _)| metric == wanted)
                    .and_then(|(_, latest)| *latest)
            })
            .collect())
    }
}
