use super::base_threshold;
use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

const BYTES_PER_GIB: f64 = 1_073_741_824.0;
/// Share of each data node volume the service leaves to the domain.
const USABLE_VOLUME_SHARE: f64 = 0.75;

/// OpenSearch domains (`DescribeDomain` status).
pub struct OpenSearchHandler {
    hooks: HookRegistry,
}

impl OpenSearchHandler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_threshold(
            "free_storage_space_threshold_dynamic",
            free_storage_space_threshold_dynamic,
        );
        Self { hooks }
    }
}

impl Default for OpenSearchHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for OpenSearchHandler {
    fn kind(&self) -> &str {
        "opensearch"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr("DomainName").unwrap_or("unknown").to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("DomainName")?,
            resource.require_str("ARN")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("DomainName")?.to_string()])
    }

    /// `ClientId` is the owning account, the first segment of `DomainId`
    /// (`123456789012/logs`).
    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        let domain_id = resource.require_str("DomainId")?;
        let client_id = domain_id.split('/').next().unwrap_or(domain_id);
        Ok(vec![
            Dimension::new("DomainName", resource.require_str("DomainName")?),
            Dimension::new("ClientId", client_id),
        ])
    }
}

/// `Threshold` percent of the usable space of one data node volume, in
/// megabytes (the unit of `FreeStorageSpace`).
pub fn free_storage_space_threshold_dynamic(
    domain: &Resource,
    spec: &AlarmSpecification,
) -> Result<f64> {
    let volume_gib = domain.require_f64("/EBSOptions/VolumeSize")?;
    let percent = base_threshold("free_storage_space_threshold_dynamic", spec)?;
    let usable_mb = volume_gib * USABLE_VOLUME_SHARE * BYTES_PER_GIB / 1_000_000.0;
    Ok(usable_mb * percent / 100.0)
}
