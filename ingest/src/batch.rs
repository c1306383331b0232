use hn_client::{HnSource, RateLimitConfig, RateLimiter};
use tracing::{info, info_span, Instrument};
use trends_core::{Category, CoreError, PostData};

use crate::fetcher::{FetchMode, PostFetcher};

/// Drains a list of thread ids through the fetcher one at a time.
///
/// Network fetches are preceded by the limiter's pause, the first one
/// included. Cached runs never pause. The first failure aborts the batch.
pub struct BatchRunner<'a, S> {
    fetcher: &'a PostFetcher<S>,
    limiter: RateLimiter,
}

impl<'a, S: HnSource> BatchRunner<'a, S> {
    pub fn new(fetcher: &'a PostFetcher<S>, rate_limit: RateLimitConfig) -> Self {
        Self {
            fetcher,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// One `PostData` per id, in input order.
    pub async fn run(
        &self,
        post_ids: &[u64],
        category: Category,
        mode: FetchMode,
    ) -> Result<Vec<PostData>, CoreError> {
        let total = post_ids.len();
        let mut posts = Vec::with_capacity(total);

        for (seq, &post_id) in post_ids.iter().enumerate() {
            if mode == FetchMode::Network {
                self.limiter.acquire_permit().await;
            }

            let post = self
                .fetcher
                .fetch(post_id, category, mode)
                .instrument(info_span!("fetch", %category, seq, post_id))
                .await?;
            info!(
                %category,
                seq,
                total,
                post_id,
                comments = post.num_top_level_comments(),
                "Fetched thread"
            );
            posts.push(post);
        }

        Ok(posts)
    }
}
