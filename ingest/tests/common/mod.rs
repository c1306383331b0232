#![allow(dead_code)]

use async_trait::async_trait;
use hn_client::{HnSource, SearchHit, SearchIndex};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use trends_core::{CoreError, HnApiError};

pub const HIRING_TITLE: &str = "Ask HN: Who is hiring? (March 2024)";
pub const LOOKING_TITLE: &str = "Ask HN: Who wants to be hired? (March 2024)";
pub const FREELANCER_TITLE: &str = "Ask HN: Freelancer? Seeking freelancer? (March 2024)";

/// In-memory stand-in for the Algolia API.
#[derive(Default)]
pub struct FakeSource {
    hits: Vec<SearchHit>,
    items: HashMap<u64, String>,
    failing: HashSet<u64>,
    index_calls: AtomicUsize,
    item_calls: Mutex<Vec<u64>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a thread to the index along with its item body.
    pub fn with_thread(mut self, post_id: u64, title: &str, created_at: i64, comments: &[&str]) -> Self {
        self.hits.push(SearchHit {
            object_id: post_id.to_string(),
            title: Some(title.to_string()),
        });
        self.items.insert(post_id, item_body(title, created_at, comments));
        self
    }

    /// Thread is listed in the index but its item fetch fails.
    pub fn with_failing_thread(mut self, post_id: u64, title: &str) -> Self {
        self.hits.push(SearchHit {
            object_id: post_id.to_string(),
            title: Some(title.to_string()),
        });
        self.failing.insert(post_id);
        self
    }

    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    pub fn item_calls(&self) -> Vec<u64> {
        self.item_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HnSource for FakeSource {
    async fn search_index(&self) -> Result<SearchIndex, CoreError> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SearchIndex {
            hits: self.hits.clone(),
        })
    }

    async fn fetch_item(&self, post_id: u64) -> Result<String, CoreError> {
        self.item_calls.lock().unwrap().push(post_id);
        if self.failing.contains(&post_id) {
            return Err(HnApiError::ServerError { status_code: 503 }.into());
        }
        self.items
            .get(&post_id)
            .cloned()
            .ok_or_else(|| HnApiError::ItemNotFound { post_id }.into())
    }
}

pub fn item_body(title: &str, created_at: i64, comments: &[&str]) -> String {
    let children: Vec<_> = comments.iter().map(|text| json!({ "text": text })).collect();
    json!({
        "created_at_i": created_at,
        "title": title,
        "children": children,
    })
    .to_string()
}
