use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Fixed pause applied before each upstream request.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub delay: Duration,
}

impl RateLimitConfig {
    pub fn algolia() -> Self {
        Self {
            delay: Duration::from_millis(5000),
        }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Sequential request pacer. Each caller that needs its own budget (one per
/// category in the pipeline) owns its own limiter; nothing is shared.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: AtomicU64,
    total_wait_ms: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: AtomicU64::new(0),
            total_wait_ms: AtomicU64::new(0),
        }
    }

    /// Sleeps the configured delay, then lets the request through.
    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();
        if !self.config.delay.is_zero() {
            tracing::trace!("Pacing request for {:?}", self.config.delay);
            sleep(self.config.delay).await;
        }

        let queue_wait_time = start_time.elapsed();
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_wait_ms
            .fetch_add(queue_wait_time.as_millis() as u64, Ordering::Relaxed);

        RateLimitPermit { queue_wait_time }
    }

    pub fn get_rate_limit_status(&self) -> RateLimitStatus {
        RateLimitStatus {
            delay: self.config.delay,
            requests: self.requests.load(Ordering::Relaxed),
            total_wait: Duration::from_millis(self.total_wait_ms.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitStatus {
    pub delay: Duration,
    pub requests: u64,
    pub total_wait: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algolia_config() {
        let config = RateLimitConfig::algolia();
        assert_eq!(config.delay, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_permit_waits_full_delay() {
        let limiter = RateLimiter::new(RateLimitConfig::from_millis(5000));
        let start = Instant::now();

        for _ in 0..3 {
            let permit = limiter.acquire_permit().await;
            assert!(permit.queue_wait_time >= Duration::from_millis(5000));
        }

        assert!(start.elapsed() >= Duration::from_millis(15000));
        let status = limiter.get_rate_limit_status();
        assert_eq!(status.requests, 3);
        assert!(status.total_wait >= Duration::from_millis(15000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_does_not_sleep() {
        let limiter = RateLimiter::new(RateLimitConfig::from_millis(0));
        let start = Instant::now();

        limiter.acquire_permit().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.get_rate_limit_status().requests, 1);
    }
}
