//! Client for the HN Algolia API: thread index search and per-item fetches,
//! with request pacing and bounded retries.

pub mod api;
pub mod rate_limiter;
pub mod retry;


pub use api::{HnApiClient, HnSource, RawChild, RawItem, SearchHit, SearchIndex};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry::{RetryConfig, RetryExecutor};
