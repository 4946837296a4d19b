use cwguard_engine::EngineError;

/// Errors returned by the CloudWatch adapter.
///
/// # Examples
///
/// ```rust
/// use cwguard_cloud::error::CloudError;
///
/// let err = CloudError::Api {
///     operation: "PutMetricAlarm",
///     message: "Throttling".to_string(),
/// };
/// assert!(err.to_string().contains("PutMetricAlarm"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// A CloudWatch API call failed.
    #[error("CloudWatch: {operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    /// A response could not be interpreted.
    #[error("CloudWatch: unexpected {operation} response: {message}")]
    Response {
        operation: &'static str,
        message: String,
    },
}

impl From<CloudError> for EngineError {
    fn from(err: CloudError) -> Self {
        EngineError::Metrics(err.to_string())
    }
}

/// Convenience `Result` alias for CloudWatch operations.
pub type Result<T> = std::result::Result<T, CloudError>;
