pub mod acm;
pub mod directconnect;
pub mod dynamodb;
pub mod ebs;
pub mod ec2;
pub mod efs;
pub mod eks;
pub mod elasticache;
pub mod elb;
pub mod fsx;
pub mod kinesis;
pub mod lambda;
pub mod opensearch;
pub mod rds;
pub mod target_group;
pub mod vpn;

use cwguard_catalog::AlarmSpecification;
use cwguard_common::Resource;
use cwguard_engine::{EngineError, ResourceHandler, Result, RunContext};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Handlers by catalog key.
///
/// # Examples
///
/// ```
/// use cwguard_cloud::HandlerRegistry;
///
/// let registry = HandlerRegistry::default();
/// assert!(registry.has_handler("ec2"));
/// assert!(registry.has_handler("albtg"));
/// assert!(!registry.has_handler("sqs"));
/// ```
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) {
        self.handlers.insert(handler.kind().to_string(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.handlers.get(kind).cloned()
    }

    pub fn has_handler(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered catalog keys, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ec2::Ec2Handler::new()));
        registry.register(Arc::new(ebs::EbsHandler::new()));
        registry.register(Arc::new(rds::RdsHandler::new()));
        registry.register(Arc::new(efs::EfsHandler::new()));
        registry.register(Arc::new(elb::ElbHandler::application()));
        registry.register(Arc::new(elb::ElbHandler::network()));
        registry.register(Arc::new(target_group::TargetGroupHandler::application()));
        registry.register(Arc::new(target_group::TargetGroupHandler::network()));
        registry.register(Arc::new(lambda::LambdaHandler::new()));
        registry.register(Arc::new(dynamodb::DynamoDbHandler::new()));
        registry.register(Arc::new(eks::EksHandler::new()));
        registry.register(Arc::new(opensearch::OpenSearchHandler::new()));
        registry.register(Arc::new(acm::AcmHandler::new()));
        registry.register(Arc::new(vpn::VpnHandler::new()));
        registry.register(Arc::new(directconnect::DirectConnectHandler::new()));
        registry.register(Arc::new(elasticache::ElastiCacheHandler::new()));
        registry.register(Arc::new(fsx::FsxHandler::new()));
        registry.register(Arc::new(kinesis::KinesisHandler::new()));
        registry
    }
}

const CLUSTER_VALUE_TAGS: [&str; 2] = ["elbv2.k8s.aws/cluster", "eks:cluster-name"];
const CLUSTER_KEY_TAG: &str = "kubernetes.io/cluster/";

/// Name of the EKS cluster a resource belongs to, read from its tags.
///
/// `elbv2.k8s.aws/cluster` and `eks:cluster-name` carry the name as value;
/// `kubernetes.io/cluster/<name>` carries it in the key. Tags are examined
/// in order and the first match wins.
pub fn cluster_name_from_tags(resource: &Resource) -> Option<String> {
    let name = resource.tags().into_iter().find_map(|tag| {
        if CLUSTER_VALUE_TAGS.iter().any(|k| tag.key.contains(k)) {
            Some(tag.value)
        } else if tag.key.contains(CLUSTER_KEY_TAG) {
            tag.key.rsplit('/').next().map(str::to_string)
        } else {
            None
        }
    })?;
    (!name.is_empty()).then_some(name)
}

pub fn eks_cluster_arn(ctx: &RunContext, cluster: &str) -> String {
    format!("{}:cluster/{cluster}", ctx.arn_prefix("eks"))
}

/// Whole-string regex match of `value` against the rule's `RegexType`.
pub(crate) fn matches_regex_type(
    hook: &str,
    spec: &AlarmSpecification,
    value: &str,
) -> Result<bool> {
    let pattern = spec
        .metric_specifications
        .regex_type
        .as_deref()
        .ok_or_else(|| hook_error(hook, "MetricSpecifications.RegexType is not set"))?;
    let re = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| hook_error(hook, format!("invalid RegexType: {e}")))?;
    Ok(re.is_match(value))
}

/// The rule's static threshold, used as the input of a threshold formula.
pub(crate) fn base_threshold(hook: &str, spec: &AlarmSpecification) -> Result<f64> {
    spec.threshold()
        .ok_or_else(|| hook_error(hook, "MetricSpecifications.Threshold is not set"))
}

pub(crate) fn hook_error(hook: &str, message: impl Into<String>) -> EngineError {
    EngineError::Hook {
        name: hook.to_string(),
        message: message.into(),
    }
}
