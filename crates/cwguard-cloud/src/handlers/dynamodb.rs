use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

const TABLE_NAME: &str = "/TableInfo/TableName";
const TABLE_ID: &str = "/TableInfo/TableId";

/// Tables as returned by `DescribeTable` (`{"TableInfo": {...}}`).
#[derive(Default)]
pub struct DynamoDbHandler {
    hooks: HookRegistry,
}

impl DynamoDbHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceHandler for DynamoDbHandler {
    fn kind(&self) -> &str {
        "dynamodb"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource.str_attr(TABLE_NAME).unwrap_or("unknown").to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        Ok(AlarmIdentity::new(
            resource.require_str(TABLE_NAME)?,
            resource.require_str(TABLE_ID)?,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str(TABLE_NAME)?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "TableName",
            resource.require_str(TABLE_NAME)?,
        )])
    }
}
