use crate::context::RunContext;
use crate::error::Result;
use crate::hooks::HookRegistry;
use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};

/// Resource-type knowledge the engine delegates to: how a resource is named,
/// which CloudWatch dimensions address it, which rules apply and the named
/// hooks its catalog rules may reference.
pub trait ResourceHandler: Send + Sync {
    /// Catalog key of the resource type (`"ec2"`, `"rds"`, ...).
    fn kind(&self) -> &str;

    fn hooks(&self) -> &HookRegistry;

    /// Identifier used in logs and reports.
    fn resource_id(&self, resource: &Resource) -> String;

    /// Component name and cloud id written into the alarm description.
    fn identity(&self, resource: &Resource, ctx: &RunContext) -> Result<AlarmIdentity>;

    /// Alarm-name components, most specific first.
    fn id_components(&self, resource: &Resource) -> Result<Vec<String>>;

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>>;

    /// Structural applicability of a rule (sub-type, engine, ...).
    fn applies(&self, _resource: &Resource, _spec: &AlarmSpecification) -> bool {
        true
    }

    /// Post-processes a merged specification before hooks run.
    fn post_process(&self, _resource: &Resource, spec: AlarmSpecification) -> AlarmSpecification {
        spec
    }
}
