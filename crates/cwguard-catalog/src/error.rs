/// Failures while obtaining the default catalog. Any of these is fatal to a
/// run: nothing can be resolved without defaults.
///
/// # Examples
///
/// ```rust
/// use cwguard_catalog::error::CatalogError;
///
/// let err = CatalogError::Remote {
///     bucket: "alarm-defaults".to_string(),
///     key: "prod/default_values.json".to_string(),
///     message: "NoSuchKey".to_string(),
/// };
/// assert!(err.to_string().contains("s3://alarm-defaults/prod/default_values.json"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The local catalog file could not be read.
    #[error("Catalog: cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The remote catalog object could not be fetched.
    #[error("Catalog: cannot fetch s3://{bucket}/{key}: {message}")]
    Remote {
        bucket: String,
        key: String,
        message: String,
    },

    /// The document does not match the catalog schema.
    #[error("Catalog: malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convenience `Result` alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
