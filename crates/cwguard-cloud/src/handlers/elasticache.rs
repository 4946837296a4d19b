use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

const CLUSTER_ID: &str = "/ClusterInfo/0/CacheClusterId";
const REPLICATION_GROUP: &str = "/ClusterInfo/0/ReplicationGroupId";

/// ElastiCache clusters. The inventory entry wraps the `DescribeCacheClusters`
/// output in `ClusterInfo`; the first node cluster is alarmed.
#[derive(Default)]
pub struct ElastiCacheHandler {
    hooks: HookRegistry,
}

impl ElastiCacheHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for ElastiCacheHandler {
    fn kind(&self) -> &str {
        "elasticache"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr(CLUSTER_ID).unwrap_or("unknown").to_string()
    }

    /// Named after the replication group, or the cluster itself when it
    /// has none.
    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        let cluster_id = resource.require_str(CLUSTER_ID)?;
        Ok(AlarmIdentity::new(
            resource.str_attr(REPLICATION_GROUP).unwrap_or(cluster_id),
            cluster_id,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str(CLUSTER_ID)?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "CacheClusterId",
            resource.require_str(CLUSTER_ID)?,
        )])
    }
}
