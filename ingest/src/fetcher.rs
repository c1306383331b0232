use hn_client::{HnSource, RawItem};
use std::sync::Arc;
use tracing::debug;
use trends_core::{CacheError, Category, Comment, CoreError, HnApiError, PostData};

use crate::cache::PostCache;
use crate::classifier;
use crate::normalize::clean_comment;

/// Where item bodies are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Network fetch; every response is written to the cache.
    Network,
    /// Cache only. A missing entry is an error, there is no network fallback.
    Cached,
}

impl FetchMode {
    pub fn from_use_cache(use_cache: bool) -> Self {
        if use_cache {
            FetchMode::Cached
        } else {
            FetchMode::Network
        }
    }
}

pub struct PostFetcher<S> {
    source: Arc<S>,
    cache: PostCache,
}

impl<S: HnSource> PostFetcher<S> {
    pub fn new(source: Arc<S>, cache: PostCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &PostCache {
        &self.cache
    }

    /// Builds the category's view of one thread.
    ///
    /// In network mode the cache write happens before parsing and a
    /// pre-existing entry fails the fetch with `CacheError::WriteConflict`.
    pub async fn fetch(
        &self,
        post_id: u64,
        category: Category,
        mode: FetchMode,
    ) -> Result<PostData, CoreError> {
        let body = match mode {
            FetchMode::Cached => self.cache.read(post_id, category).await?,
            FetchMode::Network => {
                let body = self.source.fetch_item(post_id).await?;
                self.cache.write(post_id, category, &body).await?;
                body
            }
        };

        let item: RawItem = serde_json::from_str(&body).map_err(|e| match mode {
            FetchMode::Cached => CoreError::Cache(CacheError::Corrupt {
                key: PostCache::key(post_id, category),
                details: e.to_string(),
            }),
            FetchMode::Network => CoreError::HnApi(HnApiError::InvalidResponse {
                details: format!("item {}: {}", post_id, e),
            }),
        })?;

        Ok(build_post_data(post_id, category, item))
    }
}

fn build_post_data(post_id: u64, category: Category, item: RawItem) -> PostData {
    let rule = classifier::rule(category);
    let comments: Vec<Comment> = item
        .children
        .into_iter()
        .filter_map(|child| child.text)
        .map(|text| clean_comment(&text))
        .filter(|text| rule.admits_comment(text))
        .map(Comment::new)
        .collect();

    debug!(post_id, %category, comments = comments.len(), "Built post data");
    PostData::new(
        post_id,
        item.created_at_i,
        item.title.unwrap_or_default(),
        comments,
    )
}
