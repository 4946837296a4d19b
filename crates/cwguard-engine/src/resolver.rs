use crate::error::{EngineError, Result};
use cwguard_catalog::{AlarmSpecification, RuleSet};
use cwguard_store::{OverrideGateway, OverrideRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an override field goes when more than one nested group of the
/// template already has a field of that name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedMatchPolicy {
    /// Overwrite the field in every nested group that has it.
    #[default]
    All,
    /// Overwrite only the first nested group, in template field order.
    First,
}

/// What to do with an override field that does not fit the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverridePolicy {
    /// Drop the field, log a warning, keep the rest of the override.
    #[default]
    Lenient,
    /// Fail the resolution with [`EngineError::MalformedOverride`].
    Strict,
}

/// Post-processing callback run on the merged specification.
pub type ExtraDataHook<'a> = &'a (dyn Fn(AlarmSpecification) -> AlarmSpecification + Send + Sync);

/// Produces the resolved specification for one rule and one resource.
///
/// # Examples
///
/// ```
/// use cwguard_catalog::Catalog;
/// use cwguard_engine::Resolver;
/// use cwguard_store::OverrideGateway;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let catalog = Catalog::from_json_str(r#"{"ec2": {"disk_used_percent": {
///     "MetricName": "disk_used_percent",
///     "Namespace": "CWAgent",
///     "Period": 300,
///     "EvaluationPeriods": 1,
///     "ComparisonOperator": "GreaterThanThreshold",
///     "MetricSpecifications": {"AlarmName": "DiskUsed-", "Threshold": 85}
/// }}}"#).unwrap();
/// let resolver = Resolver::new(OverrideGateway::disabled(), Some("prod".into()));
/// let components = vec!["Root".to_string(), "i-abc".to_string()];
/// let spec = resolver
///     .resolve("disk_used_percent", catalog.rules_for("ec2").unwrap(), &components, None)
///     .await
///     .unwrap();
/// assert_eq!(spec.alarm_name.as_deref(), Some("prod-DiskUsed-Root-i-abc"));
/// assert_eq!(spec.threshold(), Some(85.0));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resolver {
    gateway: OverrideGateway,
    alarm_prefix: Option<String>,
    nested_match: NestedMatchPolicy,
    override_policy: OverridePolicy,
}

impl Resolver {
    pub fn new(gateway: OverrideGateway, alarm_prefix: Option<String>) -> Self {
        Self {
            gateway,
            alarm_prefix: alarm_prefix.filter(|p| !p.is_empty()),
            nested_match: NestedMatchPolicy::default(),
            override_policy: OverridePolicy::default(),
        }
    }

    pub fn with_nested_match(mut self, policy: NestedMatchPolicy) -> Self {
        self.nested_match = policy;
        self
    }

    pub fn with_override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    pub fn gateway(&self) -> &OverrideGateway {
        &self.gateway
    }

    /// Alarm-name prefix of a rule: the global prefix (if any) joined with
    /// `-` to the template's name suffix.
    pub fn name_prefix(&self, spec: &AlarmSpecification) -> String {
        match &self.alarm_prefix {
            Some(prefix) => format!("{prefix}-{}", spec.name_suffix()),
            None => spec.name_suffix().to_string(),
        }
    }

    /// Resolves `rule_id` for the resource identified by `components`
    /// (most specific first).
    ///
    /// The returned specification is an owned copy: the rule set is never
    /// modified. Threshold and creation hooks are not applied here.
    pub async fn resolve(
        &self,
        rule_id: &str,
        rules: &RuleSet,
        components: &[String],
        extra: Option<ExtraDataHook<'_>>,
    ) -> Result<AlarmSpecification> {
        let template = rules.get(rule_id).ok_or_else(|| EngineError::UnknownRuleId {
            rule_id: rule_id.to_string(),
        })?;

        let mut spec = template.clone();
        let prefix = self.name_prefix(&spec);
        spec.alarm_name = Some(format!("{prefix}{}", components.join("-")));

        if let Some(record) = self.find_override(&prefix, components).await {
            tracing::debug!(
                rule_id,
                alarm_name = spec.alarm_name.as_deref().unwrap_or_default(),
                fields = record.len(),
                "Applying override"
            );
            spec = apply_override(&spec, &record, self.nested_match, self.override_policy)?;
        }

        if let Some(hook) = extra {
            spec = hook(spec);
        }
        Ok(spec)
    }

    /// Most specific override first: the full component list, then with the
    /// last component dropped, down to the rule-wide key `prefix`.
    async fn find_override(&self, prefix: &str, components: &[String]) -> Option<OverrideRecord> {
        if !self.gateway.is_enabled() {
            return None;
        }

        for len in (1..=components.len()).rev() {
            let mut local_id = components[..len].join("-");
            if !local_id.ends_with('-') {
                local_id.push('-');
            }
            if let Some(record) = self.gateway.find(&format!("{prefix}{local_id}")).await {
                return Some(record);
            }
        }
        self.gateway.find(prefix).await
    }
}

/// Merges `record` into a copy of `spec`.
///
/// Each field overwrites its namesake inside the template's nested groups
/// (`MetricSpecifications`, `Classification`, object-valued extras); a field
/// no group has is set at the top level. A field whose new value does not fit
/// the template is handled according to `policy`.
pub fn apply_override(
    spec: &AlarmSpecification,
    record: &OverrideRecord,
    nested: NestedMatchPolicy,
    policy: OverridePolicy,
) -> Result<AlarmSpecification> {
    let mut current = spec.to_value()?;

    for (field, value) in record {
        let mut candidate = current.clone();
        merge_field(&mut candidate, field, value, nested);

        match AlarmSpecification::from_value(candidate.clone()) {
            Ok(_) => current = candidate,
            Err(e) => match policy {
                OverridePolicy::Strict => {
                    return Err(EngineError::MalformedOverride {
                        field: field.clone(),
                        message: e.to_string(),
                    })
                }
                OverridePolicy::Lenient => {
                    tracing::warn!(
                        alarm_name = spec.alarm_name.as_deref().unwrap_or_default(),
                        field = %field,
                        error = %e,
                        "Ignoring malformed override field"
                    );
                }
            },
        }
    }

    Ok(AlarmSpecification::from_value(current)?)
}

fn merge_field(target: &mut Value, field: &str, value: &Value, nested: NestedMatchPolicy) {
    let Some(top) = target.as_object_mut() else {
        return;
    };

    let mut placed = false;
    for group in top.values_mut() {
        if let Value::Object(group) = group {
            if let Some(slot) = group.get_mut(field) {
                *slot = value.clone();
                placed = true;
                if nested == NestedMatchPolicy::First {
                    break;
                }
            }
        }
    }

    if !placed {
        top.insert(field.to_string(), value.clone());
    }
}
