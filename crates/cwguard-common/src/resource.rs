use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A discovered cloud resource: its resource-type name (the catalog key,
/// e.g. `"ec2"`) and the raw describe output of the provider API.
///
/// Handlers read attributes by their API names (`"InstanceId"`,
/// `"AllocatedStorage"`, ...). Nested attributes are addressed with a JSON
/// pointer (`"/ScalingConfigurationInfo/MaxCapacity"`).
///
/// # Examples
///
/// ```
/// use cwguard_common::Resource;
/// use serde_json::json;
///
/// let volume = Resource::new("ebs", json!({
///     "VolumeId": "vol-1",
///     "Size": 100,
///     "Tags": [{"Key": "Name", "Value": "data"}]
/// }));
/// assert_eq!(volume.str_attr("VolumeId"), Some("vol-1"));
/// assert_eq!(volume.f64_attr("Size"), Some(100.0));
/// assert_eq!(volume.tag("Name"), Some("data"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: String,
    pub attributes: Value,
}

/// A key/value tag attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A required attribute is absent or has the wrong JSON type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} resource is missing attribute '{attribute}'")]
pub struct AttributeError {
    pub kind: String,
    pub attribute: String,
}

impl Resource {
    pub fn new(kind: impl Into<String>, attributes: Value) -> Self {
        Self {
            kind: kind.into(),
            attributes,
        }
    }

    /// Looks up an attribute by top-level key or, when `path` starts with
    /// `/`, by JSON pointer.
    pub fn attr(&self, path: &str) -> Option<&Value> {
        if path.starts_with('/') {
            self.attributes.pointer(path)
        } else {
            self.attributes.get(path)
        }
    }

    pub fn str_attr(&self, path: &str) -> Option<&str> {
        self.attr(path).and_then(Value::as_str)
    }

    pub fn f64_attr(&self, path: &str) -> Option<f64> {
        self.attr(path).and_then(Value::as_f64)
    }

    pub fn require_str(&self, path: &str) -> Result<&str, AttributeError> {
        self.str_attr(path).ok_or_else(|| self.missing(path))
    }

    pub fn require_f64(&self, path: &str) -> Result<f64, AttributeError> {
        self.f64_attr(path).ok_or_else(|| self.missing(path))
    }

    pub fn missing(&self, path: &str) -> AttributeError {
        AttributeError {
            kind: self.kind.clone(),
            attribute: path.to_string(),
        }
    }

    /// Resource tags. Accepts both the EC2 list form
    /// (`[{"Key": .., "Value": ..}]`) and the plain map form used by
    /// Lambda and EFS.
    pub fn tags(&self) -> Vec<Tag> {
        match self.attributes.get("Tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| {
                    v.as_str().map(|v| Tag {
                        key: k.clone(),
                        value: v.to_string(),
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        match self.attributes.get("Tags")? {
            Value::Array(items) => items.iter().find_map(|item| {
                (item.get("Key")?.as_str()? == key)
                    .then(|| item.get("Value")?.as_str())
                    .flatten()
            }),
            Value::Object(map) => map.get(key)?.as_str(),
            _ => None,
        }
    }

    pub fn has_tags(&self) -> bool {
        self.attributes.get("Tags").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pointer_paths_reach_nested_attributes() {
        let db = Resource::new(
            "rds",
            json!({"ScalingConfigurationInfo": {"MaxCapacity": 16, "MinCapacity": 2}}),
        );
        assert_eq!(db.f64_attr("/ScalingConfigurationInfo/MaxCapacity"), Some(16.0));
        assert!(db.f64_attr("/ScalingConfigurationInfo/Missing").is_none());
    }

    #[test]
    fn map_form_tags_are_supported() {
        let function = Resource::new("lambda", json!({"Tags": {"team": "core"}}));
        assert_eq!(function.tag("team"), Some("core"));
        assert_eq!(function.tags().len(), 1);
    }

    #[test]
    fn require_str_reports_kind_and_attribute() {
        let instance = Resource::new("ec2", json!({}));
        let err = instance.require_str("InstanceId").unwrap_err();
        assert_eq!(err.attribute, "InstanceId");
        assert!(err.to_string().contains("ec2"));
    }
}
