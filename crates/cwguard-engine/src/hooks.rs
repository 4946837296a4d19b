use crate::context::RunContext;
use crate::error::{EngineError, Result};
use crate::sink::MetricSource;
use async_trait::async_trait;
use cwguard_catalog::{AlarmSpecification, HookKind};
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether a rule applies to a resource instance.
pub type CreationHook = fn(&Resource, &AlarmSpecification) -> Result<bool>;

/// Computes the threshold for a resource instance.
pub type ThresholdHook = fn(&Resource, &AlarmSpecification) -> Result<f64>;

/// One alarm produced by a core hook: its identifier components and metric
/// dimensions. The identity defaults to the resource's own.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmTarget {
    pub components: Vec<String>,
    pub dimensions: Vec<Dimension>,
    pub identity: Option<AlarmIdentity>,
}

impl AlarmTarget {
    pub fn new(components: Vec<String>, dimensions: Vec<Dimension>) -> Self {
        Self {
            components,
            dimensions,
            identity: None,
        }
    }
}

/// Everything a core hook may look at.
pub struct CoreContext<'a> {
    pub resource: &'a Resource,
    pub rule_id: &'a str,
    /// The catalog template of the rule (not yet resolved).
    pub template: &'a AlarmSpecification,
    pub identity: &'a AlarmIdentity,
    pub run: &'a RunContext,
    pub metrics: &'a dyn MetricSource,
}

/// Replaces the single-alarm path of a rule: enumerates the alarms the rule
/// expands to for one resource (zero, one or many). Each target is then
/// resolved and submitted like a regular alarm.
#[async_trait]
pub trait CoreHook: Send + Sync {
    async fn expand(&self, ctx: &CoreContext<'_>) -> Result<Vec<AlarmTarget>>;
}

/// Name -> function table of the hooks one resource type provides.
///
/// # Examples
///
/// ```
/// use cwguard_catalog::HookKind;
/// use cwguard_engine::HookRegistry;
///
/// let mut hooks = HookRegistry::new();
/// hooks.register_creation("always_dynamic", |_, _| Ok(true));
/// assert!(hooks.contains(HookKind::Creation, "always_dynamic"));
/// assert!(hooks.threshold("always_dynamic").is_err());
/// ```
#[derive(Default, Clone)]
pub struct HookRegistry {
    creation: HashMap<String, CreationHook>,
    threshold: HashMap<String, ThresholdHook>,
    core: HashMap<String, Arc<dyn CoreHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_creation(&mut self, name: impl Into<String>, hook: CreationHook) {
        self.creation.insert(name.into(), hook);
    }

    pub fn register_threshold(&mut self, name: impl Into<String>, hook: ThresholdHook) {
        self.threshold.insert(name.into(), hook);
    }

    pub fn register_core(&mut self, name: impl Into<String>, hook: Arc<dyn CoreHook>) {
        self.core.insert(name.into(), hook);
    }

    pub fn creation(&self, name: &str) -> Result<CreationHook> {
        self.creation
            .get(name)
            .copied()
            .ok_or_else(|| unknown(HookKind::Creation, name))
    }

    pub fn threshold(&self, name: &str) -> Result<ThresholdHook> {
        self.threshold
            .get(name)
            .copied()
            .ok_or_else(|| unknown(HookKind::Threshold, name))
    }

    pub fn core(&self, name: &str) -> Result<Arc<dyn CoreHook>> {
        self.core
            .get(name)
            .cloned()
            .ok_or_else(|| unknown(HookKind::Core, name))
    }

    pub fn contains(&self, kind: HookKind, name: &str) -> bool {
        match kind {
            HookKind::Creation => self.creation.contains_key(name),
            HookKind::Threshold => self.threshold.contains_key(name),
            HookKind::Core => self.core.contains_key(name),
        }
    }

    pub fn len(&self) -> usize {
        self.creation.len() + self.threshold.len() + self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unknown(kind: HookKind, name: &str) -> EngineError {
    EngineError::UnknownHook {
        kind,
        name: name.to_string(),
    }
}
