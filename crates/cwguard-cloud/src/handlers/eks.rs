use async_trait::async_trait;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{
    AlarmTarget, CoreContext, CoreHook, HookRegistry, ResourceHandler, Result, RunContext,
};
use std::sync::Arc;

/// EKS clusters, as returned by `DescribeCluster` (lower-case keys).
pub struct EksHandler {
    hooks: HookRegistry,
}

impl EksHandler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_core(
            "cluster_failed_node_count_core_dynamic",
            Arc::new(ClusterMetricHook),
        );
        Self { hooks }
    }
}

impl Default for EksHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for EksHandler {
    fn kind(&self) -> &str {
        "eks"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr("name").unwrap_or("unknown").to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("name")?,
            resource.require_str("arn")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("name")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "ClusterName",
            resource.require_str("name")?,
        )])
    }
}

/// One alarm on the cluster-wide Container Insights series of the rule's
/// metric. Node and pod level series of the same metric share the alarm
/// name and are not alarmed.
struct ClusterMetricHook;

#[async_trait]
impl CoreHook for ClusterMetricHook {
    async fn expand(&self, ctx: &CoreContext<'_>) -> Result<Vec<AlarmTarget>> {
        let cluster = ctx.resource.require_str("name")?;
        let cluster_dimension = Dimension::new("ClusterName", cluster);
        let listed = ctx
            .metrics
            .list_metrics(
                &ctx.template.namespace,
                &ctx.template.metric_name,
                std::slice::from_ref(&cluster_dimension),
            )
            .await?;

        let targets: Vec<AlarmTarget> = listed
            .into_iter()
            .filter(|m| m.dimensions == [cluster_dimension.clone()])
            .take(1)
            .map(|m| AlarmTarget::new(vec![cluster.to_string()], m.dimensions))
            .collect();
        if targets.is_empty() {
            tracing::debug!(
                cluster,
                metric = %ctx.template.metric_name,
                "No cluster-level metric reported, Container Insights may be disabled"
            );
        }
        Ok(targets)
    }
}
