use cwguard_common::{ComparisonOperator, Dimension, TreatMissingData};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Static template for one monitoring rule.
///
/// Top-level fields mirror the CloudWatch `PutMetricAlarm` request. Two
/// nested groups carry everything that is not sent verbatim:
/// [`MetricSpecifications`] (name suffix, threshold, hook names, filters) and
/// [`ClassificationTemplate`] (event classification metadata).
///
/// Every field is serialized, `None` included, so that the serialized form
/// lists exactly the fields the template knows about. Override merging
/// depends on that.
///
/// # Examples
///
/// ```
/// use cwguard_catalog::AlarmSpecification;
///
/// let spec: AlarmSpecification = serde_json::from_str(r#"{
///     "MetricName": "CPUUtilization",
///     "Namespace": "AWS/EC2",
///     "Statistic": "Average",
///     "Period": 300,
///     "EvaluationPeriods": 3,
///     "ComparisonOperator": "GreaterThanThreshold",
///     "MetricSpecifications": {"AlarmName": "CPUUtilization-", "Threshold": 90}
/// }"#).unwrap();
/// assert_eq!(spec.metric_specifications.threshold, Some(90.0));
/// assert!(spec.create);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmSpecification {
    /// Fully-qualified alarm name; filled in by the resolver.
    #[serde(default)]
    pub alarm_name: Option<String>,
    pub metric_name: String,
    pub namespace: String,
    #[serde(default)]
    pub statistic: Option<String>,
    #[serde(default)]
    pub extended_statistic: Option<String>,
    pub period: u32,
    pub evaluation_periods: u32,
    #[serde(default)]
    pub datapoints_to_alarm: Option<u32>,
    pub comparison_operator: ComparisonOperator,
    #[serde(default)]
    pub treat_missing_data: Option<TreatMissingData>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Explicit description. When absent a JSON description is generated.
    #[serde(default)]
    pub alarm_description: Option<String>,
    /// `;`-separated action ARNs. Absent = run defaults, empty = no actions.
    #[serde(default)]
    pub alarm_actions: Option<String>,
    #[serde(default, rename = "OKActions")]
    pub ok_actions: Option<String>,
    /// Dimension template. When present it replaces the handler's dimensions.
    #[serde(default)]
    pub dimensions: Option<Vec<Dimension>>,
    /// `false` suppresses provisioning of this alarm.
    #[serde(default = "default_create")]
    pub create: bool,
    pub metric_specifications: MetricSpecifications,
    #[serde(default)]
    pub classification: Option<ClassificationTemplate>,
    /// Fields the schema does not name; kept so overrides can append them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_create() -> bool {
    true
}

/// The non-CloudWatch part of a rule template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricSpecifications {
    /// Alarm name suffix, conventionally ending with `-`.
    pub alarm_name: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub dynamic_threshold: Option<String>,
    #[serde(default)]
    pub dynamic_creation: Option<String>,
    #[serde(default)]
    pub dynamic_core: Option<String>,
    /// Resource sub-types the rule applies to. Absent = all.
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub engines: Option<Vec<String>>,
    #[serde(default)]
    pub engine_modes: Option<Vec<String>>,
    #[serde(default)]
    pub regex_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event classification attached to an alarm's generated description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassificationTemplate {
    #[serde(default)]
    pub event_type: Option<ClassificationValue>,
    #[serde(default)]
    pub monitor_component: Option<ClassificationValue>,
    #[serde(default)]
    pub impact: Option<i64>,
}

/// A classification value: either fixed, or keyed by platform and selected
/// by the resource handler (e.g. `{"ec2": "..", "eks": ".."}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassificationValue {
    Fixed(String),
    ByPlatform(BTreeMap<String, String>),
}

impl ClassificationValue {
    /// Narrows a per-platform value to the entry for `platform`. Fixed values
    /// are returned unchanged; an unknown platform yields `None`.
    pub fn select(&self, platform: &str) -> Option<ClassificationValue> {
        match self {
            Self::Fixed(_) => Some(self.clone()),
            Self::ByPlatform(map) => map.get(platform).cloned().map(Self::Fixed),
        }
    }

    pub fn as_fixed(&self) -> Option<&str> {
        match self {
            Self::Fixed(value) => Some(value),
            Self::ByPlatform(_) => None,
        }
    }
}

impl AlarmSpecification {
    pub fn threshold(&self) -> Option<f64> {
        self.metric_specifications.threshold
    }

    pub fn name_suffix(&self) -> &str {
        &self.metric_specifications.alarm_name
    }

    /// True when the rule's `Types` filter is absent or contains `kind`.
    pub fn allows_type(&self, kind: &str) -> bool {
        self.metric_specifications
            .types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t == kind))
    }

    /// Serialized form used for field-level merging.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
