use crate::error::{Result, StoreError};
use crate::{OverrideRecord, OverrideStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// In-process override store, used for offline runs and tests.
///
/// A local overrides file is a JSON object mapping alarm names to records:
///
/// ```json
/// { "prod-DiskUsed-Root-i-0abc": { "Threshold": 95, "EvaluationPeriods": 5 } }
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryOverrideStore {
    records: HashMap<String, Vec<OverrideRecord>>,
}

impl MemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, record: OverrideRecord) {
        self.records.entry(key.into()).or_default().push(record);
    }

    pub fn with(mut self, key: impl Into<String>, record: OverrideRecord) -> Self {
        self.insert(key, record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn from_json_str(document: &str) -> Result<Self> {
        let parsed: HashMap<String, Value> = serde_json::from_str(document)?;
        let mut store = Self::new();
        for (key, value) in parsed {
            match value {
                Value::Object(record) => store.insert(key, record),
                other => {
                    return Err(StoreError::Decode {
                        key,
                        message: format!("expected an object, found {other}"),
                    })
                }
            }
        }
        Ok(store)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let document = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json_str(&document)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "Loaded local override records"
        );
        Ok(store)
    }
}

#[async_trait]
impl OverrideStore for MemoryOverrideStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, key: &str) -> Result<Vec<OverrideRecord>> {
        Ok(self.records.get(key).cloned().unwrap_or_default())
    }
}
