use crate::context::RunContext;
use cwguard_catalog::{AlarmSpecification, ClassificationValue};
use cwguard_common::{AlarmIdentity, ComparisonOperator, Dimension, TreatMissingData};
use serde::Serialize;
use serde_json::{Map, Value};

/// Event classification carried into the alarm description.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Classification {
    pub event_type: Option<String>,
    pub monitor_component: Option<String>,
    pub impact: Option<i64>,
}

impl Classification {
    fn from_spec(spec: &AlarmSpecification) -> Self {
        let Some(template) = &spec.classification else {
            return Self::default();
        };
        let fixed = |value: &Option<ClassificationValue>| {
            value
                .as_ref()
                .and_then(ClassificationValue::as_fixed)
                .map(str::to_string)
        };
        Self {
            event_type: fixed(&template.event_type),
            monitor_component: fixed(&template.monitor_component),
            impact: template.impact,
        }
    }
}

/// The concrete alarm handed to an [`crate::AlarmSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedAlarmParameters {
    pub alarm_name: String,
    pub alarm_description: String,
    pub metric_name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_statistic: Option<String>,
    pub period: u32,
    pub evaluation_periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<u32>,
    pub comparison_operator: ComparisonOperator,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treat_missing_data: Option<TreatMissingData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub threshold: f64,
    pub dimensions: Vec<Dimension>,
    pub alarm_actions: Vec<String>,
    #[serde(rename = "OKActions")]
    pub ok_actions: Vec<String>,
    /// `false` = resolved but not to be provisioned.
    #[serde(skip)]
    pub create: bool,
    #[serde(skip)]
    pub identity: AlarmIdentity,
    #[serde(skip)]
    pub classification: Classification,
    /// Top-level fields appended by overrides that no schema field covers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedAlarmParameters {
    /// Flattens a resolved specification with its final threshold and
    /// dimensions.
    ///
    /// An explicit `AlarmDescription` is kept verbatim; otherwise a JSON
    /// description is generated from the identity and classification. Actions
    /// default to the run's topics, an empty string disables them and any
    /// other value is a `;`-separated list.
    pub fn build(
        spec: AlarmSpecification,
        threshold: f64,
        dimensions: Vec<Dimension>,
        identity: AlarmIdentity,
        ctx: &RunContext,
    ) -> Self {
        let classification = Classification::from_spec(&spec);
        let alarm_description = match &spec.alarm_description {
            Some(description) => description.clone(),
            None => describe(&identity, &classification, ctx),
        };

        Self {
            alarm_name: spec.alarm_name.unwrap_or_default(),
            alarm_description,
            metric_name: spec.metric_name,
            namespace: spec.namespace,
            statistic: spec.statistic,
            extended_statistic: spec.extended_statistic,
            period: spec.period,
            evaluation_periods: spec.evaluation_periods,
            datapoints_to_alarm: spec.datapoints_to_alarm,
            comparison_operator: spec.comparison_operator,
            treat_missing_data: spec.treat_missing_data,
            unit: spec.unit,
            threshold,
            dimensions,
            alarm_actions: actions(spec.alarm_actions.as_deref(), ctx),
            ok_actions: actions(spec.ok_actions.as_deref(), ctx),
            create: spec.create,
            identity,
            classification,
            extra: spec.extra,
        }
    }
}

fn describe(identity: &AlarmIdentity, classification: &Classification, ctx: &RunContext) -> String {
    let mut doc = Map::new();
    if let Some(alias) = &ctx.account_alias {
        doc.insert(alias.key.clone(), Value::from(alias.value.clone()));
    }
    doc.insert("ci".into(), Value::from(identity.ci_name.clone()));
    doc.insert("cloudid".into(), Value::from(identity.cloud_id.clone()));
    if let Some(event_type) = classification.event_type.as_deref().filter(|s| !s.is_empty()) {
        doc.insert("eventtype".into(), Value::from(event_type));
    }
    if let Some(component) = classification
        .monitor_component
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        doc.insert("monitorcomponent".into(), Value::from(component));
    }
    if let Some(impact) = classification.impact {
        doc.insert("impact".into(), Value::from(impact));
    }
    Value::Object(doc).to_string()
}

fn actions(configured: Option<&str>, ctx: &RunContext) -> Vec<String> {
    match configured {
        None => ctx.alarm_actions.clone(),
        Some(list) => list
            .split(';')
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
