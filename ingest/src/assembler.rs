use futures::future::try_join_all;
use hn_client::{HnSource, RateLimitConfig};
use std::sync::Arc;
use tracing::info;
use trends_core::{Category, CoreError, Dataset, PostData};

use crate::batch::BatchRunner;
use crate::cache::PostCache;
use crate::classifier::classify;
use crate::fetcher::{FetchMode, PostFetcher};

/// Builds the full dataset: one index fetch, then one batch per category.
pub struct DatasetAssembler<S> {
    source: Arc<S>,
    fetcher: PostFetcher<S>,
    rate_limit: RateLimitConfig,
}

impl<S: HnSource> DatasetAssembler<S> {
    pub fn new(source: Arc<S>, cache: PostCache, rate_limit: RateLimitConfig) -> Self {
        Self {
            fetcher: PostFetcher::new(source.clone(), cache),
            source,
            rate_limit,
        }
    }

    /// Categories run concurrently, each with its own pacing budget, so a
    /// network run issues up to four requests per delay period. Any failing
    /// category fails the whole assembly.
    ///
    /// The search index is always fetched from the network, also in cached
    /// mode. Posts are ordered oldest first.
    pub async fn assemble(&self, mode: FetchMode) -> Result<Dataset, CoreError> {
        let index = self.source.search_index().await?;

        let batches = Category::ALL.into_iter().map(|category| {
            let post_ids = classify(&index, category);
            async move {
                info!(%category, count = post_ids.len(), "Found threads");
                let runner = BatchRunner::new(&self.fetcher, self.rate_limit.clone());
                let mut posts = runner.run(&post_ids, category, mode).await?;
                sort_chronologically(&mut posts);
                Ok::<_, CoreError>((category, posts))
            }
        });

        let dataset: Dataset = try_join_all(batches).await?.into_iter().collect();
        info!(
            hiring = dataset.posts(Category::Hiring).len(),
            looking = dataset.posts(Category::Looking).len(),
            hiring_freelancer = dataset.posts(Category::HiringFreelancer).len(),
            freelancer_looking = dataset.posts(Category::FreelancerLooking).len(),
            "Assembled dataset"
        );
        Ok(dataset)
    }
}

/// Stable, so threads sharing a timestamp keep index order.
fn sort_chronologically(posts: &mut [PostData]) {
    posts.sort_by_key(PostData::timestamp_ms);
}
