use crate::{OverrideRecord, OverrideStore};
use std::sync::Arc;

/// Returns the single alternative spelling tried when an exact key has no
/// record: the key without its trailing `-`, or with one appended.
///
/// # Examples
///
/// ```
/// use cwguard_store::hyphen_variant;
///
/// assert_eq!(hyphen_variant("prod-Disk-Root-i-1-"), "prod-Disk-Root-i-1");
/// assert_eq!(hyphen_variant("prod-Disk-Root-i-1"), "prod-Disk-Root-i-1-");
/// ```
pub fn hyphen_variant(key: &str) -> String {
    match key.strip_suffix('-') {
        Some(stripped) => stripped.to_string(),
        None => format!("{key}-"),
    }
}

/// Front door to the override store.
///
/// A gateway built with [`OverrideGateway::disabled`] answers every lookup
/// with `None`, which reduces resolution to pure catalog defaults.
#[derive(Clone, Default)]
pub struct OverrideGateway {
    store: Option<Arc<dyn OverrideStore>>,
}

impl OverrideGateway {
    pub fn new(store: Arc<dyn OverrideStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up the override for `key`, then for its hyphen variant.
    ///
    /// Returns the first record in store order. Store failures are logged
    /// and reported as `None`.
    pub async fn find(&self, key: &str) -> Option<OverrideRecord> {
        let store = self.store.as_ref()?;

        if let Some(record) = Self::first(store.as_ref(), key).await {
            return Some(record);
        }
        Self::first(store.as_ref(), &hyphen_variant(key)).await
    }

    async fn first(store: &dyn OverrideStore, key: &str) -> Option<OverrideRecord> {
        match store.query(key).await {
            Ok(records) => {
                let found = records.into_iter().next();
                if found.is_some() {
                    tracing::debug!(store = store.name(), key, "Override record found");
                }
                found
            }
            Err(e) => {
                tracing::warn!(
                    store = store.name(),
                    key,
                    error = %e,
                    "Override lookup failed, using catalog defaults"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for OverrideGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideGateway")
            .field("store", &self.store.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}
