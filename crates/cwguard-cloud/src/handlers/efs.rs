use super::base_threshold;
use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

/// Burst credits a file system earns per TiB of stored data.
const CREDITS_PER_TIB: f64 = 2.31e12;

pub struct EfsHandler {
    hooks: HookRegistry,
}

impl EfsHandler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_creation(
            "burst_credit_balance_creation_dynamic",
            burst_credit_balance_creation_dynamic,
        );
        hooks.register_threshold(
            "burst_credit_balance_threshold_dynamic",
            burst_credit_balance_threshold_dynamic,
        );
        Self { hooks }
    }
}

impl Default for EfsHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHandler for EfsHandler {
    fn kind(&self) -> &str {
        "efs"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        resource
            .str_attr("FileSystemId")
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        let id = resource.require_str("FileSystemId")?;
        Ok(AlarmIdentity::new(
            resource.str_attr("Name").unwrap_or(id),
            id,
        ))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        Ok(vec![resource.require_str("FileSystemId")?.to_string()])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        Ok(vec![Dimension::new(
            "FileSystemId",
            resource.require_str("FileSystemId")?,
        )])
    }
}

pub fn burst_credit_balance_creation_dynamic(
    efs: &Resource,
    _spec: &AlarmSpecification,
) -> Result<bool> {
    Ok(efs.require_str("ThroughputMode")? == "bursting")
}

/// `Threshold` percent of the credits earned by the stored TiB (at least
/// one).
pub fn burst_credit_balance_threshold_dynamic(
    efs: &Resource,
    spec: &AlarmSpecification,
) -> Result<f64> {
    let size = efs.require_f64("/SizeInBytes/Value")?;
    let percent = base_threshold("burst_credit_balance_threshold_dynamic", spec)?;
    Ok(stored_tib(size) * CREDITS_PER_TIB * percent / 100.0)
}

/// Size in whole units of the largest binary prefix it reaches, counted as
/// one below a TiB.
fn stored_tib(size_bytes: f64) -> f64 {
    if size_bytes < 1.0 {
        return 1.0;
    }
    let exp = size_bytes.log(1024.0).floor();
    if exp > 3.0 {
        (size_bytes / 1024f64.powf(exp)).floor()
    } else {
        1.0
    }
}
