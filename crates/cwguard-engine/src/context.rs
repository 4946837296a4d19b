use serde::Serialize;

/// Account alias written into generated alarm descriptions under `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountAlias {
    pub key: String,
    pub value: String,
}

/// Immutable per-run settings threaded through resolution and dispatch.
///
/// Built once from the run configuration and shared read-only by every
/// worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub region: String,
    pub account_id: String,
    /// Global alarm-name prefix; joined to the rule suffix with `-`.
    pub alarm_prefix: Option<String>,
    /// Default alarm and OK actions (SNS topic ARNs).
    pub alarm_actions: Vec<String>,
    pub account_alias: Option<AccountAlias>,
}

impl RunContext {
    pub fn new(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    /// ARN prefix `arn:aws:<service>:<region>:<account>` for building
    /// resource ARNs.
    pub fn arn_prefix(&self, service: &str) -> String {
        format!("arn:aws:{service}:{}:{}", self.region, self.account_id)
    }
}
