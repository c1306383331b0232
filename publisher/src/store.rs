//! Object store construction for each configured backend.

use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use trends_core::config::{StorageBackend, StorageConfig, StorageCredentials};
use trends_core::{ConfigError, CoreError};

pub fn r2_endpoint(account_id: &str) -> String {
    format!("https://{}.r2.cloudflarestorage.com", account_id)
}

/// Builds the store named by `config.backend`. Remote backends read their
/// credentials from the environment.
pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, CoreError> {
    match config.backend {
        StorageBackend::R2 => r2_store(&StorageCredentials::from_env()?),
        StorageBackend::S3 => s3_store(&config.region, &StorageCredentials::from_env()?),
        StorageBackend::Local => local_store(&config.local_dir),
        StorageBackend::Memory => {
            info!("Publishing to an in-memory store; artifacts are discarded on exit");
            Ok(Arc::new(InMemory::new()))
        }
    }
}

pub fn r2_store(credentials: &StorageCredentials) -> Result<Arc<dyn ObjectStore>, CoreError> {
    let account_id = credentials.account_id.as_deref().ok_or_else(|| {
        ConfigError::MissingEnvironmentVariable {
            var_name: "CF_ACCOUNT_ID".to_string(),
        }
    })?;

    let endpoint = r2_endpoint(account_id);
    info!(endpoint = %endpoint, bucket = %credentials.bucket, "Using R2 store");
    let store = AmazonS3Builder::new()
        .with_endpoint(endpoint)
        .with_region("auto")
        .with_bucket_name(&credentials.bucket)
        .with_access_key_id(&credentials.access_key_id)
        .with_secret_access_key(&credentials.secret_access_key)
        .build()
        .map_err(|e| invalid_storage("storage.backend", e))?;
    Ok(Arc::new(store))
}

pub fn s3_store(
    region: &str,
    credentials: &StorageCredentials,
) -> Result<Arc<dyn ObjectStore>, CoreError> {
    info!(region, bucket = %credentials.bucket, "Using S3 store");
    let store = AmazonS3Builder::new()
        .with_region(region)
        .with_bucket_name(&credentials.bucket)
        .with_access_key_id(&credentials.access_key_id)
        .with_secret_access_key(&credentials.secret_access_key)
        .build()
        .map_err(|e| invalid_storage("storage.region", e))?;
    Ok(Arc::new(store))
}

/// Directory-backed store; the directory is created if missing.
pub fn local_store(dir: &Path) -> Result<Arc<dyn ObjectStore>, CoreError> {
    std::fs::create_dir_all(dir)?;
    let store =
        LocalFileSystem::new_with_prefix(dir).map_err(|e| invalid_storage("storage.local_dir", e))?;
    info!(dir = %dir.display(), "Using local store");
    Ok(Arc::new(store))
}

fn invalid_storage(field: &str, error: object_store::Error) -> CoreError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: error.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(account_id: Option<&str>) -> StorageCredentials {
        StorageCredentials {
            account_id: account_id.map(str::to_string),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "trends".to_string(),
        }
    }

    #[test]
    fn test_r2_endpoint() {
        assert_eq!(
            r2_endpoint("abc123"),
            "https://abc123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_r2_requires_account_id() {
        let result = r2_store(&credentials(None));
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::MissingEnvironmentVariable { var_name }))
                if var_name == "CF_ACCOUNT_ID"
        ));
    }

    #[test]
    fn test_r2_store_builds() {
        assert!(r2_store(&credentials(Some("abc123"))).is_ok());
    }

    #[test]
    fn test_local_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/nested");

        local_store(&target).unwrap();

        assert!(target.is_dir());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        assert!(build_store(&config).is_ok());
    }
}
