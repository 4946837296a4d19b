use cwguard_catalog::HookKind;
use cwguard_common::AttributeError;

/// Errors raised while resolving or provisioning one (resource, rule) pair.
///
/// None of these is fatal to a run: the dispatcher logs them with the
/// resource and rule and moves on to the next rule.
///
/// # Examples
///
/// ```rust
/// use cwguard_catalog::HookKind;
/// use cwguard_engine::EngineError;
///
/// let err = EngineError::UnknownHook {
///     kind: HookKind::Threshold,
///     name: "iops_threshold_dynamic".to_string(),
/// };
/// assert!(err.to_string().contains("DynamicThreshold"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The rule id is not part of the resource type's rule set.
    #[error("Engine: unknown rule id '{rule_id}'")]
    UnknownRuleId { rule_id: String },

    /// The catalog names a hook the resource handler does not register.
    #[error("Engine: unknown {kind} hook '{name}'")]
    UnknownHook { kind: HookKind, name: String },

    /// An override field cannot be applied to the template (strict policy).
    #[error("Engine: malformed override field '{field}': {message}")]
    MalformedOverride { field: String, message: String },

    /// The resolved specification carries no threshold and no hook computes one.
    #[error("Engine: rule '{rule_id}' has no threshold")]
    MissingThreshold { rule_id: String },

    /// A resource attribute required by a handler or hook is absent.
    #[error("Engine: {0}")]
    MissingAttribute(#[from] AttributeError),

    /// A hook rejected its input.
    #[error("Engine: hook '{name}' failed: {message}")]
    Hook { name: String, message: String },

    /// Metric listing or datapoint retrieval failed.
    #[error("Engine: metric query failed: {0}")]
    Metrics(String),

    /// The provisioning call failed.
    #[error("Engine: cannot submit alarm '{alarm_name}': {message}")]
    Submit { alarm_name: String, message: String },

    /// A specification could not be converted to or from its merge form.
    #[error("Engine: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
