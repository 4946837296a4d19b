use crate::error::CloudError;
use cwguard_common::types::dimension_value;
use cwguard_engine::{MetricDescriptor, MetricSource};

/// Collapses metrics that share the value of the `group_by` dimension into
/// the one whose latest datapoint is most recent.
///
/// The agent republishes a metric under a new dimension set when, for
/// example, a device is renamed; the stale series must not get an alarm.
/// Groups with a single member are kept as is. A multi-member group with no
/// datapoint in the lookback window is dropped. Group order follows first
/// appearance in `metrics`.
pub async fn sanitize_metrics(
    source: &dyn MetricSource,
    metrics: Vec<MetricDescriptor>,
    group_by: &str,
) -> cwguard_engine::Result<Vec<MetricDescriptor>> {
    if metrics.len() <= 1 {
        return Ok(metrics);
    }

    let mut groups: Vec<(String, Vec<MetricDescriptor>)> = Vec::new();
    for metric in metrics {
        let key = dimension_value(&metric.dimensions, group_by)
            .unwrap_or_default()
            .to_string();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(metric),
            None => groups.push((key, vec![metric])),
        }
    }

    let mut kept = Vec::with_capacity(groups.len());
    for (key, mut members) in groups {
        if members.len() == 1 {
            kept.append(&mut members);
            continue;
        }

        let latest = source.latest_datapoints(&members).await?;
        if latest.len() != members.len() {
            return Err(CloudError::Response {
                operation: "GetMetricStatistics",
                message: format!(
                    "{} timestamps for {} metrics",
                    latest.len(),
                    members.len()
                ),
            }
            .into());
        }

        let newest = latest
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(i, ts)| ts.map(|ts| (i, ts)))
            .max_by_key(|(_, ts)| *ts)
            .map(|(i, _)| i);

        match newest {
            Some(index) => {
                tracing::debug!(
                    group_by,
                    group = %key,
                    candidates = members.len(),
                    "Kept most recently reporting metric"
                );
                kept.push(members.swap_remove(index));
            }
            None => {
                tracing::debug!(group_by, group = %key, "No recent datapoints, dropping group");
            }
        }
    }
    Ok(kept)
}
