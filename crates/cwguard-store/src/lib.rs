//! Override store gateway.
//!
//! Operators correct catalog defaults for one specific alarm by writing an
//! [`OverrideRecord`] keyed by the alarm's fully-qualified name. This crate
//! exposes the narrow query contract the resolver needs
//! ([`OverrideStore`]) and the [`OverrideGateway`] wrapping it with the
//! trailing-hyphen retry and the "store unavailable means no override"
//! policy.

pub mod dynamo;
pub mod error;
pub mod gateway;
pub mod memory;


use async_trait::async_trait;
use serde_json::{Map, Value};

pub use dynamo::{DynamoOverrideStore, DEFAULT_KEY_ATTRIBUTE};
pub use error::StoreError;
pub use gateway::{hyphen_variant, OverrideGateway};
pub use memory::MemoryOverrideStore;

/// Sparse field-name -> value corrections for one alarm.
pub type OverrideRecord = Map<String, Value>;

/// Point lookups of override records by exact alarm-name key.
///
/// Implementations must be safe to share across tasks: one store instance
/// serves every concurrent resolution of a run.
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Short label used in logs (`"dynamodb:<table>"`, `"memory"`).
    fn name(&self) -> &str;

    /// All records stored under exactly `key`, in store order.
    async fn query(&self, key: &str) -> error::Result<Vec<OverrideRecord>>;
}
