use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

pub struct EbsHandler {
    hooks: HookRegistry,
}

impl EbsHandler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_creation("burstbalance_creation_dynamic", burstbalance_creation_dynamic);
        Self { hooks }
    }
}

impl Default for EbsHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Instance the volume is currently attached to.
fn attached_instance(volume: &Resource) -> Option<&str> {
    volume
        .attr("Attachments")?
        .as_array()?
        .iter()
        .find(|a| a.get("State").and_then(|s| s.as_str()) == Some("attached"))
        .and_then(|a| a.get("InstanceId"))
        .and_then(|id| id.as_str())
}

impl ResourceHandler for EbsHandler {
    fn kind(&self) -> &str {
        "ebs"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr("VolumeId").unwrap_or("unknown").to_string()
    }

    /// Named after the attached instance (`EC2Name`, added by inventory),
    /// identified by its instance id.
    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        let volume_id = resource.require_str("VolumeId")?;
        let ci_name = resource
            .str_attr("EC2Name")
            .or_else(|| resource.tag("Name"))
            .unwrap_or(volume_id);
        let cloud_id = attached_instance(resource).unwrap_or(volume_id);
        Ok(AlarmIdentity::new(ci_name, cloud_id))
    }

    /// Attached instance first, so the shrinking key search still reaches
    /// overrides written for the instance alone.
    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        let volume_id = resource.require_str("VolumeId")?.to_string();
        Ok(match attached_instance(resource) {
            Some(instance_id) => vec![instance_id.to_string(), volume_id],
            None => vec![volume_id],
        })
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "VolumeId",
            resource.require_str("VolumeId")?,
        )])
    }
}

/// Burst balance only exists for the volume types listed in `Types`.
pub fn burstbalance_creation_dynamic(volume: &Resource, spec: &AlarmSpecification) -> Result<bool> {
    Ok(spec.allows_type(volume.require_str("VolumeType")?))
}
