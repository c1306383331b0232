use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::HnApi(e) => {
                error!("HN API error details: {:?}", e);
            }
            CoreError::Cache(e) => {
                error!("Post cache error details: {:?}", e);
            }
            CoreError::Publish(e) => {
                error!("Publish error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::HnApi(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Delay the upstream asked for; `None` means plain backoff.
    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::HnApi(e) => e.retry_after(),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::HnApi(e) => e.user_friendly_message(),
            CoreError::Cache(e) => e.user_friendly_message(),
            CoreError::Publish(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Unauthorized { .. } => "Missing or invalid bearer token.".to_string(),
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::HnApi(_) => "HN_API".to_string(),
            CoreError::Cache(_) => "CACHE".to_string(),
            CoreError::Publish(_) => "PUBLISH".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Unauthorized { .. } => "UNAUTHORIZED".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for HnApiError {
    fn log_error(&self) -> &Self {
        error!("HnApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("HnApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            HnApiError::RateLimitExceeded { .. } => true,
            HnApiError::RequestTimeout => true,
            HnApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            HnApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            HnApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests to the HN API. Wait {} seconds before trying again.",
                retry_after
            ),
            HnApiError::ItemNotFound { post_id } => {
                format!("HN item {} could not be found.", post_id)
            }
            HnApiError::RequestTimeout => {
                "Request to the HN API timed out. Please try again.".to_string()
            }
            _ => "HN API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            HnApiError::RateLimitExceeded { .. } => "HN_RATE_LIMIT".to_string(),
            HnApiError::ItemNotFound { .. } => "HN_ITEM_NOT_FOUND".to_string(),
            HnApiError::RequestTimeout => "HN_TIMEOUT".to_string(),
            HnApiError::InvalidResponse { .. } => "HN_INVALID_RESPONSE".to_string(),
            HnApiError::ServerError { .. } => "HN_SERVER_ERROR".to_string(),
            HnApiError::UnexpectedStatus { .. } => "HN_UNEXPECTED_STATUS".to_string(),
        }
    }
}

impl ErrorExt for CacheError {
    fn log_error(&self) -> &Self {
        error!("CacheError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CacheError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CacheError::Miss { key } => format!(
                "Post {} is not cached. Run once without --use-cache to populate it.",
                key
            ),
            CacheError::WriteConflict { key } => format!(
                "Post {} is already cached. Clear the cache directory before refetching.",
                key
            ),
            CacheError::Corrupt { key, .. } => format!(
                "Cached post {} is unreadable. Delete it and refetch.",
                key
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CacheError::Miss { .. } => "CACHE_MISS".to_string(),
            CacheError::WriteConflict { .. } => "CACHE_WRITE_CONFLICT".to_string(),
            CacheError::Corrupt { .. } => "CACHE_CORRUPT".to_string(),
        }
    }
}

impl ErrorExt for PublishError {
    fn log_error(&self) -> &Self {
        error!("PublishError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("PublishError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            PublishError::Upload { key, .. } => format!(
                "Uploading {} failed. The previously published data is still live.",
                key
            ),
            PublishError::Promote { key, .. } => format!(
                "Publishing {} failed after staging. Check the bucket for mixed revisions.",
                key
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            PublishError::Upload { .. } => "PUBLISH_UPLOAD_FAILED".to_string(),
            PublishError::Promote { .. } => "PUBLISH_PROMOTE_FAILED".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors are typically not retryable
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
