use crate::config::RunConfig;
use cwguard_catalog::{Catalog, HookKind};
use cwguard_cloud::HandlerRegistry;
use cwguard_engine::Resolver;
use cwguard_store::{DynamoOverrideStore, MemoryOverrideStore, OverrideGateway};
use std::path::Path;
use std::sync::Arc;

/// Builds the override gateway the configuration asks for: a DynamoDB
/// table, a local JSON file, or none.
pub fn build_gateway(
    config: &RunConfig,
    sdk: Option<&aws_config::SdkConfig>,
) -> anyhow::Result<OverrideGateway> {
    if let Some(table) = &config.overrides.table_name {
        let sdk = sdk.ok_or_else(|| anyhow::anyhow!("AWS configuration required for table '{table}'"))?;
        tracing::info!(table = %table, "Using DynamoDB overrides");
        let store = DynamoOverrideStore::from_sdk_config(sdk, table.clone())
            .with_key_attribute(config.overrides.key_attribute.clone());
        return Ok(OverrideGateway::new(Arc::new(store)));
    }
    if let Some(file) = &config.overrides.file {
        let store = MemoryOverrideStore::from_json_file(Path::new(file))?;
        return Ok(OverrideGateway::new(Arc::new(store)));
    }
    tracing::info!("No override store configured, catalog defaults only");
    Ok(OverrideGateway::disabled())
}

pub fn build_resolver(config: &RunConfig, gateway: OverrideGateway) -> Resolver {
    Resolver::new(gateway, config.alarm_prefix.clone())
        .with_nested_match(config.resolution.nested_match)
        .with_override_policy(config.resolution.malformed_override)
}

/// A catalog entry no handler can serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogProblem {
    UnknownResourceType {
        resource_type: String,
    },
    UnknownHook {
        resource_type: String,
        rule_id: String,
        kind: HookKind,
        name: String,
    },
}

impl std::fmt::Display for CatalogProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownResourceType { resource_type } => {
                write!(f, "{resource_type}: no handler for this resource type")
            }
            Self::UnknownHook {
                resource_type,
                rule_id,
                kind,
                name,
            } => write!(f, "{resource_type}/{rule_id}: {kind} '{name}' is not registered"),
        }
    }
}

/// Checks that every resource type of the catalog has a handler and every
/// hook name it references is registered by that handler.
pub fn validate_catalog(catalog: &Catalog, handlers: &HandlerRegistry) -> Vec<CatalogProblem> {
    let mut problems: Vec<CatalogProblem> = catalog
        .resource_types()
        .filter(|kind| !handlers.has_handler(kind))
        .map(|kind| CatalogProblem::UnknownResourceType {
            resource_type: kind.to_string(),
        })
        .collect();

    for reference in catalog.hook_references() {
        let Some(handler) = handlers.get(reference.resource_type) else {
            continue;
        };
        if !handler.hooks().contains(reference.kind, reference.name) {
            problems.push(CatalogProblem::UnknownHook {
                resource_type: reference.resource_type.to_string(),
                rule_id: reference.rule_id.to_string(),
                kind: reference.kind,
                name: reference.name.to_string(),
            });
        }
    }
    problems
}
