use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use std::path::PathBuf;

/// File name of the catalog document, locally and under an S3 prefix.
pub const DEFAULT_CATALOG_FILE: &str = "default_values.json";

/// Where the default catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    S3 { bucket: String, key: String },
}

impl CatalogSource {
    /// Builds an S3 source whose object key is `prefix` followed by
    /// [`DEFAULT_CATALOG_FILE`].
    pub fn s3(bucket: impl Into<String>, prefix: &str) -> Self {
        Self::S3 {
            bucket: bucket.into(),
            key: format!("{prefix}{DEFAULT_CATALOG_FILE}"),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::S3 { bucket, key } => format!("s3://{bucket}/{key}"),
        }
    }

    /// Loads and parses the catalog. `sdk` is only consulted for S3 sources;
    /// when it is `None` the ambient AWS environment is used.
    pub async fn load(&self, sdk: Option<&aws_config::SdkConfig>) -> Result<Catalog> {
        let bytes = match self {
            Self::File(path) => std::fs::read(path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?,
            Self::S3 { bucket, key } => fetch_object(sdk, bucket, key).await?,
        };

        let catalog = Catalog::from_json_slice(&bytes)?;
        tracing::info!(
            source = %self.describe(),
            resource_types = catalog.resource_types().count(),
            rules = catalog.rule_count(),
            "Loaded default catalog"
        );
        Ok(catalog)
    }
}

async fn fetch_object(
    sdk: Option<&aws_config::SdkConfig>,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>> {
    let client = match sdk {
        Some(config) => aws_sdk_s3::Client::new(config),
        None => aws_sdk_s3::Client::new(&aws_config::load_from_env().await),
    };

    let remote = |message: String| CatalogError::Remote {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message,
    };

    let object = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| remote(aws_sdk_s3::error::DisplayErrorContext(&e).to_string()))?;

    let body = object
        .body
        .collect()
        .await
        .map_err(|e| remote(e.to_string()))?;

    Ok(body.into_bytes().to_vec())
}
