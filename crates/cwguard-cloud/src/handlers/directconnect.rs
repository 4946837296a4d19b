use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

/// Direct Connect connections (`DescribeConnections`, camel-case keys).
#[derive(Default)]
pub struct DirectConnectHandler {
    hooks: HookRegistry,
}

impl DirectConnectHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for DirectConnectHandler {
    fn kind(&self) -> &str {
        "directconnect"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("connectionId")
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("connectionName")?,
            resource.require_str("connectionId")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("connectionId")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "ConnectionId",
            resource.require_str("connectionId")?,
        )])
    }
}
