use crate::context::RunContext;
use crate::error::{EngineError, Result};
use crate::handler::ResourceHandler;
use crate::hooks::{AlarmTarget, CoreContext};
use crate::params::ResolvedAlarmParameters;
use crate::resolver::Resolver;
use crate::sink::{AlarmSink, MetricSource};
use cwguard_catalog::{AlarmSpecification, RuleSet};
use cwguard_common::{AlarmIdentity, Resource};
use serde::Serialize;
use std::sync::Arc;

/// What happened to one alarm of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// Handed to the sink successfully.
    Submitted { alarm_name: String },
    /// Resolved with `Create = false`; not provisioned.
    Suppressed { alarm_name: String },
    /// The creation predicate returned false.
    Skipped { alarm_name: String },
    /// The handler's applicability filter excluded the rule.
    NotApplicable { rule_id: String },
    /// One alarm of a core-hook expansion failed; its siblings still ran.
    Failed { alarm_name: String, error: String },
}

/// A rule, or one alarm of a rule, that failed for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub rule_id: String,
    /// Set when only this alarm of the rule failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_name: Option<String>,
    pub error: String,
}

/// Per-resource result of [`Dispatcher::process_resource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub kind: String,
    pub resource_id: String,
    pub outcomes: Vec<RuleOutcome>,
    pub failures: Vec<RuleFailure>,
}

impl ResourceReport {
    pub fn submitted(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::Submitted { .. }))
    }

    pub fn suppressed(&self) -> usize {
        self.count(|o| matches!(o, RuleOutcome::Suppressed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RuleOutcome::Skipped { .. } | RuleOutcome::NotApplicable { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&RuleOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Drives every rule of a resource through resolution, hooks and submission.
pub struct Dispatcher {
    resolver: Resolver,
    context: Arc<RunContext>,
    sink: Arc<dyn AlarmSink>,
    metrics: Arc<dyn MetricSource>,
}

impl Dispatcher {
    pub fn new(
        resolver: Resolver,
        context: Arc<RunContext>,
        sink: Arc<dyn AlarmSink>,
        metrics: Arc<dyn MetricSource>,
    ) -> Self {
        Self {
            resolver,
            context,
            sink,
            metrics,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Processes every rule of `rules` for `resource`. A failing rule is
    /// logged and recorded; the remaining rules still run.
    pub async fn process_resource(
        &self,
        handler: &dyn ResourceHandler,
        rules: &RuleSet,
        resource: &Resource,
    ) -> ResourceReport {
        let mut report = ResourceReport {
            kind: handler.kind().to_string(),
            resource_id: handler.resource_id(resource),
            ..ResourceReport::default()
        };

        for rule_id in rules.rule_ids() {
            match self.process_rule(handler, rules, resource, rule_id).await {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            RuleOutcome::Failed { alarm_name, error } => {
                                report.failures.push(RuleFailure {
                                    rule_id: rule_id.to_string(),
                                    alarm_name: Some(alarm_name),
                                    error,
                                })
                            }
                            other => report.outcomes.push(other),
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        kind = handler.kind(),
                        resource_id = %report.resource_id,
                        rule_id,
                        error = %e,
                        "Rule processing failed"
                    );
                    report.failures.push(RuleFailure {
                        rule_id: rule_id.to_string(),
                        alarm_name: None,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            kind = handler.kind(),
            resource_id = %report.resource_id,
            submitted = report.submitted(),
            suppressed = report.suppressed(),
            skipped = report.skipped(),
            failed = report.failures.len(),
            "Resource processed"
        );
        report
    }

    /// Processes one rule for one resource, through its core hook when the
    /// template names one, otherwise through the single-alarm path.
    ///
    /// A failing alarm of a core expansion is returned as
    /// [`RuleOutcome::Failed`] and the remaining alarms still run.
    pub async fn process_rule(
        &self,
        handler: &dyn ResourceHandler,
        rules: &RuleSet,
        resource: &Resource,
        rule_id: &str,
    ) -> Result<Vec<RuleOutcome>> {
        let template = rules.get(rule_id).ok_or_else(|| EngineError::UnknownRuleId {
            rule_id: rule_id.to_string(),
        })?;

        if !handler.applies(resource, template) {
            tracing::debug!(kind = handler.kind(), rule_id, "Rule not applicable");
            return Ok(vec![RuleOutcome::NotApplicable {
                rule_id: rule_id.to_string(),
            }]);
        }

        let identity = handler.identity(resource, &self.context)?;

        let Some(core_name) = template.metric_specifications.dynamic_core.as_deref() else {
            let target = AlarmTarget::new(
                handler.id_components(resource)?,
                handler.dimensions(resource)?,
            );
            let outcome = self
                .run_default(handler, rules, resource, rule_id, &target, &identity)
                .await?;
            return Ok(vec![outcome]);
        };

        let core = handler.hooks().core(core_name)?;
        let ctx = CoreContext {
            resource,
            rule_id,
            template,
            identity: &identity,
            run: &self.context,
            metrics: self.metrics.as_ref(),
        };
        let targets = core.expand(&ctx).await?;
        tracing::debug!(
            kind = handler.kind(),
            rule_id,
            hook = core_name,
            alarms = targets.len(),
            "Core hook expanded rule"
        );

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in &targets {
            let target_identity = target.identity.as_ref().unwrap_or(&identity);
            let outcome = match self
                .run_default(handler, rules, resource, rule_id, target, target_identity)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    let alarm_name = self.alarm_name(rules, rule_id, &target.components);
                    tracing::error!(
                        kind = handler.kind(),
                        rule_id,
                        alarm_name = %alarm_name,
                        error = %e,
                        "Alarm processing failed"
                    );
                    RuleOutcome::Failed {
                        alarm_name,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Resolves one alarm, applies the creation predicate and threshold
    /// formula named by the catalog template, and submits the result.
    pub async fn run_default(
        &self,
        handler: &dyn ResourceHandler,
        rules: &RuleSet,
        resource: &Resource,
        rule_id: &str,
        target: &AlarmTarget,
        identity: &AlarmIdentity,
    ) -> Result<RuleOutcome> {
        let params = self
            .resolve_alarm(handler, rules, resource, rule_id, target, identity)
            .await?;

        let Some(params) = params else {
            return Ok(RuleOutcome::Skipped {
                alarm_name: self.alarm_name(rules, rule_id, &target.components),
            });
        };

        if !params.create {
            tracing::info!(alarm_name = %params.alarm_name, "Alarm creation suppressed");
            return Ok(RuleOutcome::Suppressed {
                alarm_name: params.alarm_name,
            });
        }

        self.sink.submit(&params).await?;
        tracing::info!(
            alarm_name = %params.alarm_name,
            namespace = %params.namespace,
            metric = %params.metric_name,
            threshold = params.threshold,
            sink = self.sink.name(),
            "Alarm submitted"
        );
        Ok(RuleOutcome::Submitted {
            alarm_name: params.alarm_name,
        })
    }

    /// Resolved parameters for one alarm, or `None` when the creation
    /// predicate rejects it. Nothing is submitted.
    pub async fn resolve_alarm(
        &self,
        handler: &dyn ResourceHandler,
        rules: &RuleSet,
        resource: &Resource,
        rule_id: &str,
        target: &AlarmTarget,
        identity: &AlarmIdentity,
    ) -> Result<Option<ResolvedAlarmParameters>> {
        let template = rules.get(rule_id).ok_or_else(|| EngineError::UnknownRuleId {
            rule_id: rule_id.to_string(),
        })?;

        let post = |spec: AlarmSpecification| handler.post_process(resource, spec);
        let spec = self
            .resolver
            .resolve(rule_id, rules, &target.components, Some(&post))
            .await?;

        let hooks = handler.hooks();
        let ms = &template.metric_specifications;

        if let Some(name) = ms.dynamic_creation.as_deref() {
            if !hooks.creation(name)?(resource, &spec)? {
                tracing::debug!(
                    alarm_name = spec.alarm_name.as_deref().unwrap_or_default(),
                    hook = name,
                    "Creation predicate rejected alarm"
                );
                return Ok(None);
            }
        }

        let threshold = match ms.dynamic_threshold.as_deref() {
            Some(name) => hooks.threshold(name)?(resource, &spec)?,
            None => spec.threshold().ok_or_else(|| EngineError::MissingThreshold {
                rule_id: rule_id.to_string(),
            })?,
        };

        let dimensions = spec
            .dimensions
            .clone()
            .unwrap_or_else(|| target.dimensions.clone());

        Ok(Some(ResolvedAlarmParameters::build(
            spec,
            threshold,
            dimensions,
            identity.clone(),
            &self.context,
        )))
    }

    fn alarm_name(&self, rules: &RuleSet, rule_id: &str, components: &[String]) -> String {
        rules
            .get(rule_id)
            .map(|spec| format!("{}{}", self.resolver.name_prefix(spec), components.join("-")))
            .unwrap_or_default()
    }
}
