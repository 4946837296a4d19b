use anyhow::{bail, Context};
use cwguard_catalog::{CatalogSource, DEFAULT_CATALOG_FILE};
use cwguard_engine::{AccountAlias, NestedMatchPolicy, OverridePolicy, RunContext};
use cwguard_store::DEFAULT_KEY_ATTRIBUTE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub region: String,
    pub account_id: String,
    /// Prepended to every alarm name, joined with `-`.
    #[serde(default)]
    pub alarm_prefix: Option<String>,

    /// Alarm and OK action targets. Takes precedence over `sns_topic_name`.
    #[serde(default)]
    pub sns_topic_arns: Vec<String>,
    /// Topic in this account and region; the ARN is derived.
    #[serde(default)]
    pub sns_topic_name: Option<String>,

    /// Description key of the account alias; `account_alias` when unset.
    #[serde(default)]
    pub account_alias_key: Option<String>,
    #[serde(default)]
    pub account_alias_value: Option<String>,

    /// Glob patterns over resource-type names. Mutually exclusive with
    /// `exclude`.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Only inventory resources carrying this tag are processed.
    #[serde(default)]
    pub filter_tag_key: Option<String>,
    /// Required tag value; any value when unset.
    #[serde(default)]
    pub filter_tag_value: Option<String>,

    /// Resource types processed in parallel.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub overrides: OverridesConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
    /// When set the catalog is read from `s3://<s3_bucket>/<s3_prefix>default_values.json`.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    #[serde(default)]
    pub s3_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
            s3_bucket: None,
            s3_prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverridesConfig {
    /// DynamoDB table holding operator overrides.
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default = "default_key_attribute")]
    pub key_attribute: String,
    /// Local JSON overrides (`{"<alarm name>": {...}}`) for offline runs.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            table_name: None,
            key_attribute: default_key_attribute(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default)]
    pub nested_match: NestedMatchPolicy,
    #[serde(default)]
    pub malformed_override: OverridePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_inventory_path")]
    pub path: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
        }
    }
}

const DEFAULT_ACCOUNT_ALIAS_KEY: &str = "account_alias";

fn default_max_concurrent() -> usize {
    4
}

fn default_catalog_path() -> String {
    DEFAULT_CATALOG_FILE.to_string()
}

fn default_key_attribute() -> String {
    DEFAULT_KEY_ATTRIBUTE.to_string()
}

fn default_inventory_path() -> String {
    "inventory.json".to_string()
}

impl RunConfig {
    /// Reads the TOML file, applies `CWGUARD_*` environment overrides and
    /// validates the result.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file '{path}'"))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides file values with the variables `lookup` returns.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(region) = lookup("CWGUARD_REGION") {
            self.region = region;
        }
        if let Some(prefix) = lookup("CWGUARD_ALARM_PREFIX") {
            self.alarm_prefix = Some(prefix);
        }
        if let Some(table) = lookup("CWGUARD_OVERRIDE_TABLE") {
            self.overrides.table_name = Some(table);
        }
        if let Some(path) = lookup("CWGUARD_CATALOG_PATH") {
            self.catalog.path = path;
            self.catalog.s3_bucket = None;
        }
        if let Some(flag) = lookup("CWGUARD_DRY_RUN") {
            self.dry_run = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.region.trim().is_empty() {
            bail!("region must not be empty");
        }
        if self.account_id.trim().is_empty() {
            bail!("account_id must not be empty");
        }
        if !self.include.is_empty() && !self.exclude.is_empty() {
            bail!("include and exclude cannot be used together");
        }
        if self.alarm_actions().is_empty() {
            bail!("no alarm action configured: set sns_topic_arns or sns_topic_name");
        }
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be at least 1");
        }
        if self.filter_tag_value.is_some() && self.filter_tag_key.is_none() {
            bail!("filter_tag_value requires filter_tag_key");
        }
        if self.overrides.table_name.is_some() && self.overrides.file.is_some() {
            bail!("overrides.table_name and overrides.file cannot be used together");
        }
        Ok(())
    }

    pub fn alarm_actions(&self) -> Vec<String> {
        if !self.sns_topic_arns.is_empty() {
            return self.sns_topic_arns.clone();
        }
        self.sns_topic_name
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| format!("arn:aws:sns:{}:{}:{name}", self.region, self.account_id))
            .collect()
    }

    /// Whether the include/exclude patterns select `resource_type`.
    pub fn selects(&self, resource_type: &str) -> bool {
        if !self.include.is_empty() {
            return self
                .include
                .iter()
                .any(|pattern| glob_match::glob_match(pattern, resource_type));
        }
        !self
            .exclude
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, resource_type))
    }

    pub fn catalog_source(&self) -> CatalogSource {
        match &self.catalog.s3_bucket {
            Some(bucket) => CatalogSource::s3(bucket.clone(), &self.catalog.s3_prefix),
            None => CatalogSource::File(PathBuf::from(&self.catalog.path)),
        }
    }

    pub fn run_context(&self) -> RunContext {
        let account_alias = self.account_alias_value.as_ref().map(|value| AccountAlias {
            key: self
                .account_alias_key
                .clone()
                .unwrap_or_else(|| DEFAULT_ACCOUNT_ALIAS_KEY.to_string()),
            value: value.clone(),
        });
        RunContext {
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            alarm_prefix: self.alarm_prefix.clone().filter(|p| !p.is_empty()),
            alarm_actions: self.alarm_actions(),
            account_alias,
        }
    }
}
