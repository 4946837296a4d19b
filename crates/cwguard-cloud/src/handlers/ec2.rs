use super::{cluster_name_from_tags, eks_cluster_arn, matches_regex_type};
use crate::sanitize::sanitize_metrics;
use async_trait::async_trait;
use cwguard_catalog::AlarmSpecification;
use cwguard_common::types::dimension_value;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{
    AlarmTarget, CoreContext, CoreHook, HookRegistry, MetricDescriptor, ResourceHandler, Result,
    RunContext,
};
use std::sync::Arc;

const ASG_TAG: &str = "aws:autoscaling:groupName";

/// File systems that never get a disk alarm (unless mounted on `/`).
const IGNORED_FS_TYPES: [&str; 8] = [
    "tmpfs", "overlay", "nfs4", "devtmpfs", "cifs", "nfs", "squashfs", "vfat",
];
const NETWORK_FS_TYPES: [&str; 3] = ["nfs4", "cifs", "nfs"];

pub struct Ec2Handler {
    hooks: HookRegistry,
}

impl Ec2Handler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_creation(
            "cpucreditbalance_creation_dynamic",
            cpucreditbalance_creation_dynamic,
        );
        hooks.register_core(
            "memusedpercent_core_dynamic",
            Arc::new(AgentMetricHook(AgentMetric::MemoryUsed)),
        );
        hooks.register_core(
            "diskusedpercent_core_dynamic",
            Arc::new(AgentMetricHook(AgentMetric::DiskUsed)),
        );
        hooks.register_core(
            "diskfreepercent_core_dynamic",
            Arc::new(AgentMetricHook(AgentMetric::DiskFree)),
        );
        hooks.register_core(
            "networksharemount_core_dynamic",
            Arc::new(AgentMetricHook(AgentMetric::NetworkShare)),
        );
        Self { hooks }
    }
}

impl Default for Ec2Handler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for Ec2Handler {
    fn kind(&self) -> &str {
        "ec2"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr("InstanceId").unwrap_or("unknown").to_string()
    }

    /// EKS cluster first, then auto-scaling group, then the `Name` tag.
    fn identity(&self, resource: &Resource, ctx: &RunContext) -> Result<AlarmIdentity> {
        let instance_id = resource.require_str("InstanceId")?;

        if let Some(cluster) = cluster_name_from_tags(resource) {
            tracing::debug!(instance_id, cluster = %cluster, "Instance managed by EKS cluster");
            let arn = eks_cluster_arn(ctx, &cluster);
            return Ok(AlarmIdentity::new(cluster, arn));
        }

        if let Some(group) = resource.tag(ASG_TAG) {
            tracing::debug!(instance_id, group, "Instance managed by auto-scaling group");
            let arn = resource.str_attr("AutoScalingGroupARN").unwrap_or(group);
            return Ok(AlarmIdentity::new(group, arn));
        }

        Ok(AlarmIdentity::new(
            resource.tag("Name").unwrap_or_default(),
            instance_id,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("InstanceId")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "InstanceId",
            resource.require_str("InstanceId")?,
        )])
    }

    /// Narrows per-platform classification values to `eks` for cluster
    /// nodes and `ec2` otherwise.
    fn post_process(&self, resource: &Resource, mut spec: AlarmSpecification) -> AlarmSpecification {
        let platform = if cluster_name_from_tags(resource).is_some() {
            "eks"
        } else {
            "ec2"
        };
        if let Some(classification) = spec.classification.as_mut() {
            classification.event_type = classification
                .event_type
                .take()
                .and_then(|v| v.select(platform));
            classification.monitor_component = classification
                .monitor_component
                .take()
                .and_then(|v| v.select(platform));
        }
        spec
    }
}

fn is_windows(resource: &Resource) -> bool {
    let platform = resource
        .str_attr("PlatformDetails")
        .unwrap_or_default()
        .to_lowercase();
    platform.contains("windows") || platform.contains("sql server")
}

pub fn cpucreditbalance_creation_dynamic(
    instance: &Resource,
    spec: &AlarmSpecification,
) -> Result<bool> {
    let instance_type = instance.require_str("InstanceType")?;
    matches_regex_type("cpucreditbalance_creation_dynamic", spec, instance_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentMetric {
    MemoryUsed,
    DiskUsed,
    DiskFree,
    NetworkShare,
}

/// Expands a rule into one alarm per CloudWatch agent metric reported by
/// the instance. Namespace and metric name come from the rule template.
struct AgentMetricHook(AgentMetric);

#[async_trait]
impl CoreHook for AgentMetricHook {
    async fn expand(&self, ctx: &CoreContext<'_>) -> Result<Vec<AlarmTarget>> {
        let instance_id = ctx.resource.require_str("InstanceId")?;
        let listed = ctx
            .metrics
            .list_metrics(
                &ctx.template.namespace,
                &ctx.template.metric_name,
                &[Dimension::new("InstanceId", instance_id)],
            )
            .await?;

        let targets = match self.0 {
            AgentMetric::MemoryUsed => listed
                .into_iter()
                .map(|m| AlarmTarget::new(vec![instance_id.to_string()], m.dimensions))
                .collect(),
            AgentMetric::DiskUsed => sanitize_metrics(ctx.metrics, listed, "path")
                .await?
                .into_iter()
                .filter_map(|m| local_disk_target(m, "device", instance_id))
                .collect(),
            AgentMetric::DiskFree => sanitize_metrics(ctx.metrics, listed, "instance")
                .await?
                .into_iter()
                .filter_map(|m| local_disk_target(m, "instance", instance_id))
                .collect(),
            AgentMetric::NetworkShare => {
                let group_by = if is_windows(ctx.resource) {
                    "instance"
                } else {
                    "path"
                };
                sanitize_metrics(ctx.metrics, listed, group_by)
                    .await?
                    .into_iter()
                    .filter_map(|m| network_share_target(m, instance_id))
                    .collect()
            }
        };
        Ok(targets)
    }
}

fn local_disk_target(
    metric: MetricDescriptor,
    name_dimension: &str,
    instance_id: &str,
) -> Option<AlarmTarget> {
    let dims = &metric.dimensions;
    let path = dimension_value(dims, "path").unwrap_or_default();
    if path.contains("kubelet") {
        return None;
    }

    let disk = if path == "/" {
        "Root".to_string()
    } else {
        let fs_type = dimension_value(dims, "fstype").unwrap_or_default();
        if IGNORED_FS_TYPES.contains(&fs_type) {
            return None;
        }
        dimension_value(dims, name_dimension)
            .unwrap_or_default()
            .replace(':', "")
    };

    Some(AlarmTarget::new(
        vec![disk, instance_id.to_string()],
        metric.dimensions,
    ))
}

fn network_share_target(metric: MetricDescriptor, instance_id: &str) -> Option<AlarmTarget> {
    let dims = &metric.dimensions;
    let path = dimension_value(dims, "path").unwrap_or_default();
    let fs_type = dimension_value(dims, "fstype").unwrap_or_default();
    if !NETWORK_FS_TYPES.contains(&fs_type) || path.contains("kubelet") {
        return None;
    }
    Some(AlarmTarget::new(
        vec![path.to_string(), instance_id.to_string()],
        metric.dimensions,
    ))
}
