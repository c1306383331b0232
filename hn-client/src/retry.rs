use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use trends_core::config::RetrySettings;
use trends_core::{CoreError, ErrorExt};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
            backoff_multiplier: settings.backoff_multiplier,
            jitter_factor: settings.jitter_factor,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after the delay the server asked for
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Maps an error onto a strategy using its `ErrorExt` classification.
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    if !error.is_retryable() {
        return RetryStrategy::NoRetry;
    }
    match error.retry_after() {
        Some(delay) => RetryStrategy::RetryWithDelay(delay),
        None => RetryStrategy::Retry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = Duration::from_millis(config.base_delay_ms);
    let max_delay = Duration::from_millis(config.max_delay_ms);

    let exponential_delay = if attempt == 0 {
        base_delay
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    // Add jitter to prevent thundering herd
    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(max_delay)
}

/// Snapshot of retry counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryMetrics {
    pub total_retries: u64,
    pub successful_retries: u64,
    pub failed_operations: u64,
}

/// Retry executor that wraps operations with retry logic
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    total_retries: AtomicU64,
    successful_retries: AtomicU64,
    failed_operations: AtomicU64,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            total_retries: AtomicU64::new(0),
            successful_retries: AtomicU64::new(0),
            failed_operations: AtomicU64::new(0),
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. The error of the last attempt is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let start_time = Instant::now();
            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        self.successful_retries.fetch_add(1, Ordering::Relaxed);
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            debug!(
                "Attempt {} failed for {} after {:?}: {}",
                attempt + 1,
                operation_name,
                start_time.elapsed(),
                error
            );

            let has_attempts_left = attempt + 1 < max_attempts;
            let delay = match get_retry_strategy(&error) {
                RetryStrategy::Retry if has_attempts_left => calculate_delay(attempt, &self.config),
                RetryStrategy::RetryWithDelay(delay) if has_attempts_left => {
                    delay.min(Duration::from_millis(self.config.max_delay_ms))
                }
                RetryStrategy::NoRetry => {
                    debug!("Not retrying {} due to error type: {}", operation_name, error);
                    self.failed_operations.fetch_add(1, Ordering::Relaxed);
                    return Err(error);
                }
                _ => {
                    warn!(
                        "Operation {} failed after {} attempts: {}",
                        operation_name, max_attempts, error
                    );
                    self.failed_operations.fetch_add(1, Ordering::Relaxed);
                    return Err(error);
                }
            };

            info!("Retrying {} in {:?} due to: {}", operation_name, delay, error);
            self.total_retries.fetch_add(1, Ordering::Relaxed);
            sleep(delay).await;
            attempt += 1;
        }
    }

    pub fn get_metrics(&self) -> RetryMetrics {
        RetryMetrics {
            total_retries: self.total_retries.load(Ordering::Relaxed),
            successful_retries: self.successful_retries.load(Ordering::Relaxed),
            failed_operations: self.failed_operations.load(Ordering::Relaxed),
        }
    }
}
