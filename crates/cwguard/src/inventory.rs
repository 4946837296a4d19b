use anyhow::Context;
use cwguard_common::Resource;
use serde_json::Value;
use std::collections::BTreeMap;

/// Discovered resources grouped by resource type.
///
/// The on-disk form is the describe output of each service keyed by the
/// catalog resource type:
///
/// ```json
/// {"ec2": [{"InstanceId": "i-1", ...}], "rds": [{"DBInstanceIdentifier": "orders", ...}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    resources: BTreeMap<String, Vec<Resource>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory file '{path}'"))?;
        let inventory = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse inventory file '{path}'"))?;
        tracing::info!(
            path,
            resource_types = inventory.resources.len(),
            resources = inventory.len(),
            "Inventory loaded"
        );
        Ok(inventory)
    }

    pub fn from_json_str(document: &str) -> anyhow::Result<Self> {
        let raw: BTreeMap<String, Vec<Value>> = serde_json::from_str(document)?;
        let mut inventory = Self::new();
        for (kind, items) in raw {
            for attributes in items {
                inventory.push(Resource::new(kind.to_lowercase(), attributes));
            }
        }
        Ok(inventory)
    }

    pub fn push(&mut self, resource: Resource) {
        self.resources
            .entry(resource.kind.clone())
            .or_default()
            .push(resource);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn resources_for(&self, kind: &str) -> &[Resource] {
        self.resources.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps the resources tagged `key` (with value `value` when given).
    pub fn retain_tagged(&mut self, key: &str, value: Option<&str>) {
        for resources in self.resources.values_mut() {
            resources.retain(|resource| match (resource.tag(key), value) {
                (Some(actual), Some(wanted)) => actual == wanted,
                (Some(_), None) => true,
                (None, _) => false,
            });
        }
        self.resources.retain(|_, resources| !resources.is_empty());
    }

    /// Consumes the inventory, yielding each resource type with its
    /// resources.
    pub fn into_groups(self) -> impl Iterator<Item = (String, Vec<Resource>)> {
        self.resources.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "EC2": [
            {"InstanceId": "i-1", "Tags": [{"Key": "monitoring", "Value": "on"}]},
            {"InstanceId": "i-2", "Tags": [{"Key": "monitoring", "Value": "off"}]},
            {"InstanceId": "i-3"}
        ],
        "lambda": [
            {"FunctionName": "resize", "Tags": {"monitoring": "on"}}
        ]
    }"#;

    #[test]
    fn kinds_are_lowercased() {
        let inventory = Inventory::from_json_str(DOCUMENT).unwrap();
        assert_eq!(inventory.kinds().collect::<Vec<_>>(), vec!["ec2", "lambda"]);
        assert_eq!(inventory.resources_for("ec2").len(), 3);
        assert!(inventory.resources_for("rds").is_empty());
        assert_eq!(inventory.len(), 4);
    }

    #[test]
    fn tag_filter_with_and_without_value() {
        let mut any_value = Inventory::from_json_str(DOCUMENT).unwrap();
        any_value.retain_tagged("monitoring", None);
        assert_eq!(any_value.len(), 3);

        let mut exact = Inventory::from_json_str(DOCUMENT).unwrap();
        exact.retain_tagged("monitoring", Some("on"));
        assert_eq!(exact.resources_for("ec2").len(), 1);
        assert_eq!(exact.resources_for("lambda").len(), 1);

        let mut none = Inventory::from_json_str(DOCUMENT).unwrap();
        none.retain_tagged("owner", None);
        assert!(none.is_empty());
        assert_eq!(none.kinds().count(), 0);
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(Inventory::from_json_str(r#"{"ec2": {"InstanceId": "i-1"}}"#).is_err());
    }
}
