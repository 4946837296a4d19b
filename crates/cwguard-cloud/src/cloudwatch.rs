use crate::error::CloudError;
use async_trait::async_trait;
use aws_sdk_cloudwatch::primitives::DateTime as SmithyDateTime;
use aws_sdk_cloudwatch::types::{
    ComparisonOperator, Dimension as CwDimension, DimensionFilter, RecentlyActive, StandardUnit,
    Statistic,
};
use aws_sdk_cloudwatch::Client;
use chrono::{DateTime, Duration, Utc};
use cwguard_common::Dimension;
use cwguard_engine::{
    AlarmSink, EngineError, MetricDescriptor, MetricSource, ResolvedAlarmParameters,
};

/// Lookback window of metric listing and latest-datapoint queries.
const RECENT_HOURS: i64 = 3;
const DATAPOINT_PERIOD_SECS: i32 = 60;

fn api_error<E>(operation: &'static str, err: E) -> CloudError
where
    E: std::error::Error + 'static,
{
    CloudError::Api {
        operation,
        message: aws_sdk_cloudwatch::error::DisplayErrorContext(err).to_string(),
    }
}

/// Converts a count to the `i32` the CloudWatch API takes.
pub(crate) fn api_int(alarm_name: &str, field: &str, value: u32) -> cwguard_engine::Result<i32> {
    i32::try_from(value).map_err(|_| EngineError::Submit {
        alarm_name: alarm_name.to_string(),
        message: format!("{field} {value} exceeds the CloudWatch limit"),
    })
}

fn cw_dimension(d: &Dimension) -> CwDimension {
    CwDimension::builder().name(&d.name).value(&d.value).build()
}

/// Submits alarms with `PutMetricAlarm`.
pub struct CloudWatchAlarmSink {
    client: Client,
}

impl CloudWatchAlarmSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl AlarmSink for CloudWatchAlarmSink {
    fn name(&self) -> &str {
        "cloudwatch"
    }

    async fn submit(&self, alarm: &ResolvedAlarmParameters) -> cwguard_engine::Result<()> {
        if !alarm.extra.is_empty() {
            tracing::debug!(
                alarm_name = %alarm.alarm_name,
                fields = ?alarm.extra.keys().collect::<Vec<_>>(),
                "Ignoring fields PutMetricAlarm does not accept"
            );
        }

        let name = alarm.alarm_name.as_str();
        let period = api_int(name, "Period", alarm.period)?;
        let evaluation_periods = api_int(name, "EvaluationPeriods", alarm.evaluation_periods)?;
        let datapoints_to_alarm = alarm
            .datapoints_to_alarm
            .map(|n| api_int(name, "DatapointsToAlarm", n))
            .transpose()?;

        let mut request = self
            .client
            .put_metric_alarm()
            .alarm_name(&alarm.alarm_name)
            .alarm_description(&alarm.alarm_description)
            .namespace(&alarm.namespace)
            .metric_name(&alarm.metric_name)
            .period(period)
            .evaluation_periods(evaluation_periods)
            .threshold(alarm.threshold)
            .comparison_operator(ComparisonOperator::from(alarm.comparison_operator.as_str()))
            .set_datapoints_to_alarm(datapoints_to_alarm)
            .set_statistic(alarm.statistic.as_deref().map(Statistic::from))
            .set_extended_statistic(alarm.extended_statistic.clone())
            .set_treat_missing_data(alarm.treat_missing_data.map(|t| t.as_str().to_string()))
            .set_unit(alarm.unit.as_deref().map(StandardUnit::from));

        for dimension in &alarm.dimensions {
            request = request.dimensions(cw_dimension(dimension));
        }
        for arn in &alarm.alarm_actions {
            request = request.alarm_actions(arn);
        }
        for arn in &alarm.ok_actions {
            request = request.ok_actions(arn);
        }

        request.send().await.map_err(|e| EngineError::Submit {
            alarm_name: alarm.alarm_name.clone(),
            message: api_error("PutMetricAlarm", e).to_string(),
        })?;
        Ok(())
    }
}

/// Lists metrics and reads their latest datapoints from CloudWatch.
pub struct CloudWatchMetricSource {
    client: Client,
}

impl CloudWatchMetricSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }

    async fn latest_datapoint(
        &self,
        metric: &MetricDescriptor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> crate::error::Result<Option<DateTime<Utc>>> {
        let mut request = self
            .client
            .get_metric_statistics()
            .namespace(&metric.namespace)
            .metric_name(&metric.metric_name)
            .start_time(SmithyDateTime::from_secs(start.timestamp()))
            .end_time(SmithyDateTime::from_secs(end.timestamp()))
            .period(DATAPOINT_PERIOD_SECS)
            .statistics(Statistic::Average);
        for dimension in &metric.dimensions {
            request = request.dimensions(cw_dimension(dimension));
        }

        let output = request
            .send()
            .await
            .map_err(|e| api_error("GetMetricStatistics", e))?;

        Ok(output
            .datapoints()
            .iter()
            .filter_map(|point| point.timestamp())
            .filter_map(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()))
            .max())
    }
}

#[async_trait]
impl MetricSource for CloudWatchMetricSource {
    async fn list_metrics(
        &self,
        namespace: &str,
        metric_name: &str,
        filter: &[Dimension],
    ) -> cwguard_engine::Result<Vec<MetricDescriptor>> {
        let mut found = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_metrics()
                .namespace(namespace)
                .metric_name(metric_name)
                .recently_active(RecentlyActive::Pt3H)
                .set_next_token(next_token.take());
            for f in filter {
                request = request
                    .dimensions(DimensionFilter::builder().name(&f.name).value(&f.value).build());
            }

            let output = request
                .send()
                .await
                .map_err(|e| api_error("ListMetrics", e))?;

            for metric in output.metrics() {
                found.push(MetricDescriptor {
                    namespace: metric.namespace().unwrap_or(namespace).to_string(),
                    metric_name: metric.metric_name().unwrap_or(metric_name).to_string(),
                    dimensions: metric
                        .dimensions()
                        .iter()
                        .map(|d| {
                            Dimension::new(
                                d.name().unwrap_or_default(),
                                d.value().unwrap_or_default(),
                            )
                        })
                        .collect(),
                });
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::info!(
            namespace,
            metric_name,
            count = found.len(),
            "Listed metrics"
        );
        Ok(found)
    }

    async fn latest_datapoints(
        &self,
        metrics: &[MetricDescriptor],
    ) -> cwguard_engine::Result<Vec<Option<DateTime<Utc>>>> {
        let end = Utc::now();
        let start = end - Duration::hours(RECENT_HOURS);

        let mut latest = Vec::with_capacity(metrics.len());
        for metric in metrics {
            latest.push(self.latest_datapoint(metric, start, end).await?);
        }
        Ok(latest)
    }
}
