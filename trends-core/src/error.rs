use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("HN API error: {0}")]
    HnApi(#[from] HnApiError),

    #[error("Post cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum HnApiError {
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Item not found: {post_id}")]
    ItemNotFound { post_id: u64 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Unexpected status {status_code} from {endpoint}")]
    UnexpectedStatus { status_code: u16, endpoint: String },
}

/// Failures of the on-disk post cache. `key` is the entry's file name.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("No cached entry for {key}")]
    Miss { key: String },

    #[error("Cached entry {key} already exists")]
    WriteConflict { key: String },

    #[error("Cached entry {key} is unreadable: {details}")]
    Corrupt { key: String, details: String },
}

#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("Upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },

    #[error("Promotion of {key} failed: {reason}")]
    Promote { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
