use super::{cluster_name_from_tags, eks_cluster_arn};
use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

/// Application and network load balancers. Both share the describe output
/// shape; each has its own catalog key.
pub struct ElbHandler {
    kind: &'static str,
    hooks: HookRegistry,
}

impl ElbHandler {
    pub fn application() -> Self {
        Self {
            kind: "alb",
            hooks: HookRegistry::new(),
        }
    }

    pub fn network() -> Self {
        Self {
            kind: "nlb",
            hooks: HookRegistry::new(),
        }
    }
}

/// `LoadBalancer` dimension value: the ARN resource part without its
/// `loadbalancer/` prefix (`app/web/50dc6c495c0c9188`).
pub fn load_balancer_dimension(arn: &str) -> String {
    arn.rsplit(':')
        .next()
        .unwrap_or(arn)
        .replace("loadbalancer/", "")
}

impl ResourceHandler for ElbHandler {
    fn kind(&self) -> &str {
        self.kind
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("LoadBalancerName")
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, ctx: &RunContext) -> Result<AlarmIdentity> {
        if !resource.has_tags() {
            tracing::warn!(
                load_balancer = resource.str_attr("LoadBalancerArn").unwrap_or_default(),
                "Load balancer has no tags"
            );
        }
        if let Some(cluster) = cluster_name_from_tags(resource) {
            let arn = eks_cluster_arn(ctx, &cluster);
            return Ok(AlarmIdentity::new(cluster, arn));
        }
        Ok(AlarmIdentity::new(
            resource.require_str("LoadBalancerName")?,
            resource.require_str("LoadBalancerArn")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("LoadBalancerName")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        let arn = resource.require_str("LoadBalancerArn")?;
        Ok(vec![Dimension::new(
            "LoadBalancer",
            load_balancer_dimension(arn),
        )])
    }

    fn applies(&self, resource: &Resource, spec: &AlarmSpecification) -> bool {
        spec.allows_type(resource.str_attr("Type").unwrap_or_default())
    }
}
