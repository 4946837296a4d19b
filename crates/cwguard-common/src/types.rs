use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One CloudWatch metric dimension (`{"Name": ..., "Value": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Returns the value of the first dimension called `name`.
///
/// # Examples
///
/// ```
/// use cwguard_common::types::{dimension_value, Dimension};
///
/// let dims = vec![Dimension::new("path", "/"), Dimension::new("fstype", "xfs")];
/// assert_eq!(dimension_value(&dims, "fstype"), Some("xfs"));
/// assert_eq!(dimension_value(&dims, "device"), None);
/// ```
pub fn dimension_value<'a>(dimensions: &'a [Dimension], name: &str) -> Option<&'a str> {
    dimensions
        .iter()
        .find(|d| d.name == name)
        .map(|d| d.value.as_str())
}

/// CloudWatch comparison operator, spelled the way the CloudWatch API spells it.
///
/// # Examples
///
/// ```
/// use cwguard_common::types::ComparisonOperator;
///
/// let op: ComparisonOperator = "LessThanThreshold".parse().unwrap();
/// assert_eq!(op, ComparisonOperator::LessThanThreshold);
/// assert_eq!(op.to_string(), "LessThanThreshold");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
    LessThanLowerOrGreaterThanUpperThreshold,
    LessThanLowerThreshold,
    GreaterThanUpperThreshold,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
            Self::GreaterThanThreshold => "GreaterThanThreshold",
            Self::LessThanThreshold => "LessThanThreshold",
            Self::LessThanOrEqualToThreshold => "LessThanOrEqualToThreshold",
            Self::LessThanLowerOrGreaterThanUpperThreshold => {
                "LessThanLowerOrGreaterThanUpperThreshold"
            }
            Self::LessThanLowerThreshold => "LessThanLowerThreshold",
            Self::GreaterThanUpperThreshold => "GreaterThanUpperThreshold",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GreaterThanOrEqualToThreshold" => Ok(Self::GreaterThanOrEqualToThreshold),
            "GreaterThanThreshold" => Ok(Self::GreaterThanThreshold),
            "LessThanThreshold" => Ok(Self::LessThanThreshold),
            "LessThanOrEqualToThreshold" => Ok(Self::LessThanOrEqualToThreshold),
            "LessThanLowerOrGreaterThanUpperThreshold" => {
                Ok(Self::LessThanLowerOrGreaterThanUpperThreshold)
            }
            "LessThanLowerThreshold" => Ok(Self::LessThanLowerThreshold),
            "GreaterThanUpperThreshold" => Ok(Self::GreaterThanUpperThreshold),
            _ => Err(format!("unknown comparison operator: {s}")),
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an alarm treats missing datapoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

impl TreatMissingData {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breaching => "breaching",
            Self::NotBreaching => "notBreaching",
            Self::Ignore => "ignore",
            Self::Missing => "missing",
        }
    }
}

impl std::fmt::Display for TreatMissingData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who an alarm is about: the monitored component name (`ci_name`) and the
/// cloud identifier reported alongside it (an ARN or a resource id).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmIdentity {
    pub ci_name: String,
    pub cloud_id: String,
}

impl AlarmIdentity {
    pub fn new(ci_name: impl Into<String>, cloud_id: impl Into<String>) -> Self {
        Self {
            ci_name: ci_name.into(),
            cloud_id: cloud_id.into(),
        }
    }
}
