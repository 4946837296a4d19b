use crate::error::Result;
use crate::spec::AlarmSpecification;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monitoring rules of one resource type, keyed by rule id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: BTreeMap<String, AlarmSpecification>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule_id: impl Into<String>, spec: AlarmSpecification) {
        self.rules.insert(rule_id.into(), spec);
    }

    pub fn get(&self, rule_id: &str) -> Option<&AlarmSpecification> {
        self.rules.get(rule_id)
    }

    pub fn contains(&self, rule_id: &str) -> bool {
        self.rules.contains_key(rule_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AlarmSpecification)> {
        self.rules.iter().map(|(id, spec)| (id.as_str(), spec))
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Which extension point a hook name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Creation,
    Threshold,
    Core,
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creation => write!(f, "DynamicCreation"),
            Self::Threshold => write!(f, "DynamicThreshold"),
            Self::Core => write!(f, "DynamicCore"),
        }
    }
}

/// A hook name referenced by a catalog rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReference<'a> {
    pub resource_type: &'a str,
    pub rule_id: &'a str,
    pub kind: HookKind,
    pub name: &'a str,
}

/// The full default catalog: resource type -> [`RuleSet`].
///
/// Resource-type names are normalised to lowercase on load so that
/// `"EC2"` and `"ec2"` address the same rule set.
///
/// # Examples
///
/// ```
/// use cwguard_catalog::Catalog;
///
/// let catalog = Catalog::from_json_str(r#"{
///     "EBS": {
///         "burst_balance": {
///             "MetricName": "BurstBalance",
///             "Namespace": "AWS/EBS",
///             "Period": 300,
///             "EvaluationPeriods": 1,
///             "ComparisonOperator": "LessThanThreshold",
///             "MetricSpecifications": {"AlarmName": "BurstBalance-", "Threshold": 20}
///         }
///     }
/// }"#).unwrap();
/// assert!(catalog.rules_for("ebs").unwrap().contains("burst_balance"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    resource_types: BTreeMap<String, RuleSet>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(document: &str) -> Result<Self> {
        let raw: BTreeMap<String, RuleSet> = serde_json::from_str(document)?;
        Ok(Self::from_map(raw))
    }

    pub fn from_json_slice(document: &[u8]) -> Result<Self> {
        let raw: BTreeMap<String, RuleSet> = serde_json::from_slice(document)?;
        Ok(Self::from_map(raw))
    }

    fn from_map(raw: BTreeMap<String, RuleSet>) -> Self {
        let mut catalog = Self::new();
        for (kind, rules) in raw {
            catalog.insert(kind, rules);
        }
        catalog
    }

    pub fn insert(&mut self, resource_type: impl AsRef<str>, rules: RuleSet) {
        self.resource_types
            .insert(resource_type.as_ref().to_lowercase(), rules);
    }

    pub fn rules_for(&self, resource_type: &str) -> Option<&RuleSet> {
        self.resource_types.get(&resource_type.to_lowercase())
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resource_types.keys().map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.resource_types.values().map(RuleSet::len).sum()
    }

    /// Every hook name referenced anywhere in the catalog.
    pub fn hook_references(&self) -> Vec<HookReference<'_>> {
        let mut refs = Vec::new();
        for (resource_type, rules) in &self.resource_types {
            for (rule_id, spec) in rules.iter() {
                let ms = &spec.metric_specifications;
                let named = [
                    (HookKind::Creation, ms.dynamic_creation.as_deref()),
                    (HookKind::Threshold, ms.dynamic_threshold.as_deref()),
                    (HookKind::Core, ms.dynamic_core.as_deref()),
                ];
                for (kind, name) in named {
                    if let Some(name) = name {
                        refs.push(HookReference {
                            resource_type,
                            rule_id,
                            kind,
                            name,
                        });
                    }
                }
            }
        }
        refs
    }
}
