use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

/// Site-to-site VPN connections.
#[derive(Default)]
pub struct VpnHandler {
    hooks: HookRegistry,
}

impl VpnHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for VpnHandler {
    fn kind(&self) -> &str {
        "vpn"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("VpnConnectionId")
            .unwrap_or("unknown")
            .to_string()
    }

    /// Untagged connections get an empty CI name.
    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.tag("Name").unwrap_or_default(),
            resource.require_str("VpnConnectionId")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("VpnConnectionId")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "VpnId",
            resource.require_str("VpnConnectionId")?,
        )])
    }
}
