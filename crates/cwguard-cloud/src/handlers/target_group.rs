use super::elb::load_balancer_dimension;
use super::{cluster_name_from_tags, eks_cluster_arn};
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

const FIRST_LOAD_BALANCER: &str = "/LoadBalancerArns/0";

/// Target groups of application and network load balancers, alarmed
/// together with the first load balancer they are attached to.
pub struct TargetGroupHandler {
    kind: &'static str,
    hooks: HookRegistry,
}

impl TargetGroupHandler {
    pub fn application() -> Self {
        Self {
            kind: "albtg",
            hooks: HookRegistry::new(),
        }
    }

    pub fn network() -> Self {
        Self {
            kind: "nlbtg",
            hooks: HookRegistry::new(),
        }
    }
}

/// Load balancer name segment of its ARN
/// (`.../loadbalancer/app/web/50dc6c495c0c9188` gives `web`).
fn load_balancer_name(arn: &str) -> &str {
    let mut segments = arn.rsplit('/');
    segments.next();
    segments.next().unwrap_or(arn)
}

impl ResourceHandler for TargetGroupHandler {
    fn kind(&self) -> &str {
        self.kind
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("TargetGroupName")
            .unwrap_or("unknown")
            .to_string()
    }

    /// EKS cluster from the tags, otherwise the load balancer.
    fn identity(&self, resource: &Resource, ctx: &RunContext) -> Result<AlarmIdentity> {
        if !resource.has_tags() {
            tracing::warn!(
                target_group = resource.str_attr("TargetGroupArn").unwrap_or_default(),
                "Target group has no tags"
            );
        }
        if let Some(cluster) = cluster_name_from_tags(resource) {
            let arn = eks_cluster_arn(ctx, &cluster);
            return Ok(AlarmIdentity::new(cluster, arn));
        }
        let lb_arn = resource.require_str(FIRST_LOAD_BALANCER)?;
        Ok(AlarmIdentity::new(load_balancer_name(lb_arn), lb_arn))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("TargetGroupName")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        let tg_arn = resource.require_str("TargetGroupArn")?;
        let lb_arn = resource.require_str(FIRST_LOAD_BALANCER)?;
        Ok(vec![
            Dimension::new("TargetGroup", tg_arn.rsplit(':').next().unwrap_or(tg_arn)),
            Dimension::new("LoadBalancer", load_balancer_dimension(lb_arn)),
        ])
    }
}
