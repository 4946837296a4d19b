use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

#[derive(Default)]
pub struct FsxHandler {
    hooks: HookRegistry,
}

impl FsxHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for FsxHandler {
    fn kind(&self) -> &str {
        "fsx"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("FileSystemId")
            .unwrap_or("unknown")
            .to_string()
    }

    /// A file system without a `Name` tag cannot be attributed and fails
    /// all its rules.
    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        let name = resource
            .tag("Name")
            .ok_or_else(|| resource.missing("Tags.Name"))?;
        Ok(AlarmIdentity::new(
            name,
            resource.require_str("FileSystemId")?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("FileSystemId")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "FileSystemId",
            resource.require_str("FileSystemId")?,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwguard_engine::EngineError;
    use serde_json::json;

    #[test]
    fn name_tag_is_required() {
        let handler = FsxHandler::new();
        let ctx = RunContext::new("eu-west-1", "123456789012");
        let named = Resource::new(
            "fsx",
            json!({"FileSystemId": "fs-0123", "Tags": [{"Key": "Name", "Value": "shares"}]}),
        );
        assert_eq!(
            handler.identity(&named, &ctx).unwrap(),
            AlarmIdentity::new("shares", "fs-0123")
        );

        let unnamed = Resource::new("fsx", json!({"FileSystemId": "fs-0456", "Tags": []}));
        assert!(matches!(
            handler.identity(&unnamed, &ctx),
            Err(EngineError::MissingAttribute(e)) if e.attribute == "Tags.Name"
        ));
    }
}
