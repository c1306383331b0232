//! Application configuration.
//!
//! Tunables live in an optional TOML file; every field has a default so the
//! pipeline runs without one. Secrets (storage credentials, trigger token)
//! are only read from the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::ConfigError;

pub const DEFAULT_SEARCH_URL: &str =
    "http://hn.algolia.com/api/v1/search_by_date?tags=author_whoishiring,story&hitsPerPage=10000";
pub const DEFAULT_ITEM_URL: &str = "https://hn.algolia.com/api/v1/items/";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub hn: HnConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetrySettings,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HnConfig {
    pub search_url: String,
    /// Prefix the numeric item id is appended to.
    pub item_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for HnConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            item_url: DEFAULT_ITEM_URL.to_string(),
            user_agent: format!("hiring-trends/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub cache_dir: PathBuf,
    /// Pause before every network item fetch, per category.
    pub fetch_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cachedPosts"),
            fetch_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Cloudflare R2 through its S3-compatible endpoint.
    R2,
    S3,
    Local,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Used by the `local` backend.
    pub local_dir: PathBuf,
    /// Region for the `s3` backend. R2 always uses `auto`.
    pub region: String,
    pub multipart_chunk_bytes: usize,
    pub staging_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::R2,
            local_dir: PathBuf::from("published"),
            region: "us-east-1".to_string(),
            multipart_chunk_bytes: 5 * 1024 * 1024,
            staging_prefix: "staging".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Credentials for the remote object store, read from `CF_*` variables.
#[derive(Clone)]
pub struct StorageCredentials {
    pub account_id: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
}

impl std::fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("account_id", &self.account_id)
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl StorageCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            account_id: std::env::var("CF_ACCOUNT_ID").ok(),
            access_key_id: required_env("CF_ACCESS_KEY_ID")?,
            secret_access_key: required_env("CF_SECRET_ACCESS_KEY")?,
            bucket: required_env("CF_BUCKET")?,
        })
    }
}

/// Bearer token the trigger endpoint expects.
pub fn trigger_secret_from_env() -> Result<String, ConfigError> {
    dotenvy::dotenv().ok();
    required_env("CRON_SECRET")
}

fn required_env(var_name: &str) -> Result<String, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }),
    }
}

impl AppConfig {
    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    })?;
                info!(path = %path.display(), "Loaded configuration file");
                Self::from_toml(&content)?
            }
            None => {
                debug!("No configuration file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("hn.search_url", &self.hn.search_url),
            ("hn.item_url", &self.hn.item_url),
        ] {
            Url::parse(value).map_err(|_| invalid(field, value))?;
        }
        if self.hn.request_timeout_secs == 0 {
            return Err(invalid("hn.request_timeout_secs", "0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "0"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(invalid(
                "retry.backoff_multiplier",
                &self.retry.backoff_multiplier.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(invalid(
                "retry.jitter_factor",
                &self.retry.jitter_factor.to_string(),
            ));
        }
        // S3 multipart parts other than the last must be at least 5 MiB.
        if self.storage.multipart_chunk_bytes < 5 * 1024 * 1024 {
            return Err(invalid(
                "storage.multipart_chunk_bytes",
                &self.storage.multipart_chunk_bytes.to_string(),
            ));
        }
        if self.storage.staging_prefix.trim_matches('/').is_empty() {
            return Err(invalid("storage.staging_prefix", &self.storage.staging_prefix));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
