/// Errors raised by an override store backend.
///
/// The gateway never surfaces these to the resolver: an unavailable store is
/// logged and treated as "no override present".
///
/// # Examples
///
/// ```rust
/// use cwguard_store::error::StoreError;
///
/// let err = StoreError::Unavailable {
///     store: "dynamodb:alarm-overrides".to_string(),
///     message: "connection reset".to_string(),
/// };
/// assert!(err.to_string().contains("alarm-overrides"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the query.
    #[error("Store: {store} unavailable: {message}")]
    Unavailable { store: String, message: String },

    /// A stored record could not be converted into an override record.
    #[error("Store: cannot decode record for '{key}': {message}")]
    Decode { key: String, message: String },

    /// A local overrides file could not be read.
    #[error("Store: cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// JSON deserialization failure for a local overrides file.
    #[error("Store: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
