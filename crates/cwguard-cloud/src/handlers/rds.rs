//! RDS instances and Aurora clusters.
//!
//! A describe output carrying `DBInstanceIdentifier` is an `instance`,
//! one carrying only `DBClusterIdentifier` is a `cluster`. Rules are
//! filtered by `Types`, `Engines` and `EngineModes`.

use super::{base_threshold, matches_regex_type};
use cwguard_catalog::AlarmSpecification;
use cwguard_common::{AlarmIdentity, Dimension, Resource};
use cwguard_engine::{HookRegistry, ResourceHandler, Result, RunContext};

const GIB: f64 = 1_073_741_824.0;

pub struct RdsHandler {
    hooks: HookRegistry,
}

impl RdsHandler {
    pub fn new() -> Self {
        let mut hooks = HookRegistry::new();
        hooks.register_creation(
            "aurorareplicalag_creation_dynamic",
            aurorareplicalag_creation_dynamic,
        );
        hooks.register_creation("replicalag_creation_dynamic", replicalag_creation_dynamic);
        hooks.register_creation("burstbalance_creation_dynamic", burstbalance_creation_dynamic);
        hooks.register_creation(
            "cpucreditbalance_creation_dynamic",
            cpucreditbalance_creation_dynamic,
        );
        hooks.register_creation(
            "serverlesscapacity_creation_dynamic",
            serverlesscapacity_creation_dynamic,
        );
        hooks.register_threshold(
            "freestoragespace_threshold_dynamic",
            freestoragespace_threshold_dynamic,
        );
        hooks.register_threshold(
            "dbconnections_threshold_dynamic",
            dbconnections_threshold_dynamic,
        );
        hooks.register_threshold(
            "serverlesscapacity_threshold_dynamic",
            serverlesscapacity_threshold_dynamic,
        );
        Self { hooks }
    }
}

impl Default for RdsHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbType {
    Instance,
    Cluster,
}

impl DbType {
    fn of(database: &Resource) -> Option<Self> {
        if database.str_attr("DBInstanceIdentifier").is_some() {
            Some(Self::Instance)
        } else if database.str_attr("DBClusterIdentifier").is_some() {
            Some(Self::Cluster)
        } else {
            None
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Cluster => "cluster",
        }
    }

    fn id_attribute(self) -> &'static str {
        match self {
            Self::Instance => "DBInstanceIdentifier",
            Self::Cluster => "DBClusterIdentifier",
        }
    }

    fn arn_attribute(self) -> &'static str {
        match self {
            Self::Instance => "DBInstanceArn",
            Self::Cluster => "DBClusterArn",
        }
    }
}

fn db_type(database: &Resource) -> Result<DbType> {
    Ok(DbType::of(database).ok_or_else(|| database.missing("DBInstanceIdentifier"))?)
}

impl ResourceHandler for RdsHandler {
    fn kind(&self) -> &str {
        "rds"
    }

    fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    fn resource_id(&self, resource: &Resource) -> String {
        DbType::of(resource)
            .and_then(|t| resource.str_attr(t.id_attribute()))
            .unwrap_or("unknown")
            .to_string()
    }

    fn identity(&self, resource: &Resource, _ctx: &RunContext) -> Result<AlarmIdentity> {
        let kind = db_type(resource)?;
        let id = resource.require_str(kind.id_attribute())?;
        let arn = resource.str_attr(kind.arn_attribute()).unwrap_or(id);
        Ok(AlarmIdentity::new(id, arn))
    }

    fn id_components(&self, resource: &Resource) -> Result<Vec<String>> {
        let kind = db_type(resource)?;
        let id = resource.require_str(kind.id_attribute())?;
        Ok(vec![format!("{}-{id}", kind.as_str())])
    }

    fn dimensions(&self, resource: &Resource) -> Result<Vec<Dimension>> {
        let kind = db_type(resource)?;
        Ok(vec![Dimension::new(
            kind.id_attribute(),
            resource.require_str(kind.id_attribute())?,
        )])
    }

    fn applies(&self, resource: &Resource, spec: &AlarmSpecification) -> bool {
        let Some(kind) = DbType::of(resource) else {
            return false;
        };
        let ms = &spec.metric_specifications;
        let engine = resource.str_attr("Engine").unwrap_or_default();

        let engine_ok = ms
            .engines
            .as_ref()
            .map_or(true, |engines| engines.iter().any(|e| e == engine));
        let mode_ok = match (resource.str_attr("EngineMode"), ms.engine_modes.as_ref()) {
            (Some(mode), Some(modes)) => modes.iter().any(|m| m == mode),
            _ => true,
        };
        spec.allows_type(kind.as_str()) && engine_ok && mode_ok
    }
}

fn non_empty(database: &Resource, attribute: &str) -> bool {
    database
        .str_attr(attribute)
        .is_some_and(|value| !value.is_empty())
}

/// Aurora replica lag exists only on replicas.
pub fn aurorareplicalag_creation_dynamic(
    database: &Resource,
    _spec: &AlarmSpecification,
) -> Result<bool> {
    Ok(non_empty(database, "ReplicationSourceIdentifier"))
}

pub fn replicalag_creation_dynamic(database: &Resource, _spec: &AlarmSpecification) -> Result<bool> {
    Ok(non_empty(database, "ReadReplicaSourceDBInstanceIdentifier"))
}

pub fn burstbalance_creation_dynamic(database: &Resource, spec: &AlarmSpecification) -> Result<bool> {
    matches_regex_type(
        "burstbalance_creation_dynamic",
        spec,
        database.require_str("StorageType")?,
    )
}

pub fn cpucreditbalance_creation_dynamic(
    database: &Resource,
    spec: &AlarmSpecification,
) -> Result<bool> {
    let class = database.require_str("DBInstanceClass")?;
    matches_regex_type(
        "cpucreditbalance_creation_dynamic",
        spec,
        class.trim_start_matches("db."),
    )
}

/// Only worth alarming when the cluster can actually scale.
pub fn serverlesscapacity_creation_dynamic(
    database: &Resource,
    _spec: &AlarmSpecification,
) -> Result<bool> {
    let max = database.require_f64("/ScalingConfigurationInfo/MaxCapacity")?;
    let min = database.require_f64("/ScalingConfigurationInfo/MinCapacity")?;
    Ok(max > 1.0 && min != max)
}

/// `Threshold` percent of the allocated storage, in bytes.
pub fn freestoragespace_threshold_dynamic(
    database: &Resource,
    spec: &AlarmSpecification,
) -> Result<f64> {
    let allocated_gib = database.require_f64("AllocatedStorage")?;
    let percent = base_threshold("freestoragespace_threshold_dynamic", spec)?;
    Ok(allocated_gib * GIB * percent / 100.0)
}

/// `Threshold` percent of the engine's default connection limit, derived
/// from the instance class memory (`MemoryInfo.SizeInMiB`, attached by
/// inventory).
///
/// An unknown memory size yields 0 so that the alarm fires and gets noticed.
pub fn dbconnections_threshold_dynamic(
    database: &Resource,
    spec: &AlarmSpecification,
) -> Result<f64> {
    let percent = base_threshold("dbconnections_threshold_dynamic", spec)?;
    let Some(memory_mib) = database.f64_attr("/MemoryInfo/SizeInMiB") else {
        tracing::warn!(
            db_instance_class = database.str_attr("DBInstanceClass").unwrap_or_default(),
            "Instance class memory unknown, connection threshold forced to 0"
        );
        return Ok(0.0);
    };
    let engine = database.require_str("Engine")?;
    Ok(max_connections(engine, memory_mib * 1024.0 * 1024.0) * percent / 100.0)
}

/// Default `max_connections` of an engine for `memory_bytes` of instance
/// memory.
fn max_connections(engine: &str, memory_bytes: f64) -> f64 {
    match engine {
        "aurora" | "aurora-mysql" | "mariadb" | "mysql" => {
            (memory_bytes / 12_582_880.0).round().min(16_000.0)
        }
        "oracle-ee" | "oracle-se2" | "oracle-se" => (memory_bytes / 9_868_951.0).round().max(20_000.0),
        "postgres" | "aurora-postgresql" => (memory_bytes / 9_531_392.0).round().max(5_000.0),
        _ => 0.0,
    }
}

/// Maximum capacity minus `Threshold` capacity units.
pub fn serverlesscapacity_threshold_dynamic(
    database: &Resource,
    spec: &AlarmSpecification,
) -> Result<f64> {
    let max = database.require_f64("/ScalingConfigurationInfo/MaxCapacity")?;
    Ok(max - base_threshold("serverlesscapacity_threshold_dynamic", spec)?)
}
