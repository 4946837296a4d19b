use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

#[derive(Default)]
pub struct LambdaHandler {
    hooks: HookRegistry,
}

impl LambdaHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for LambdaHandler {
    fn kind(&self) -> &str {
        "lambda"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("FunctionName")
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str("FunctionName")?,
            resource.require_str("FunctionArn")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("FunctionName")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "FunctionName",
            resource.require_str("FunctionName")?,
        )])
    }
}
