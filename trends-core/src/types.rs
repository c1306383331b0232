use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

pub const HN_ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

/// The four buckets a thread's comments are sorted into.
///
/// Declaration order is the order categories appear in published JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Hiring,
    Looking,
    HiringFreelancer,
    FreelancerLooking,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Hiring,
        Category::Looking,
        Category::HiringFreelancer,
        Category::FreelancerLooking,
    ];

    /// Wire name, also used in cache file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hiring => "hiring",
            Category::Looking => "looking",
            Category::HiringFreelancer => "hiringFreelancer",
            Category::FreelancerLooking => "freelancerLooking",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Hiring => "Hiring",
            Category::Looking => "Looking",
            Category::HiringFreelancer => "Hiring Freelancer",
            Category::FreelancerLooking => "Freelancer Looking",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CoreError::InvalidInput {
                message: format!("unknown category '{}'", s),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One thread as published. The comment count is fixed when the value is
/// built and is not recomputed, so it survives comment stripping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    timestamp_ms: i64,
    url: String,
    title: String,
    top_level_comments: Vec<Comment>,
    num_top_level_comments: usize,
}

impl PostData {
    pub fn new(
        post_id: u64,
        created_at_secs: i64,
        title: impl Into<String>,
        comments: Vec<Comment>,
    ) -> Self {
        Self {
            timestamp_ms: created_at_secs * 1000,
            url: format!("{}{}", HN_ITEM_URL, post_id),
            title: title.into(),
            num_top_level_comments: comments.len(),
            top_level_comments: comments,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn top_level_comments(&self) -> &[Comment] {
        &self.top_level_comments
    }

    pub fn num_top_level_comments(&self) -> usize {
        self.num_top_level_comments
    }

    pub fn without_comments(&self) -> PostData {
        PostData {
            timestamp_ms: self.timestamp_ms,
            url: self.url.clone(),
            title: self.title.clone(),
            top_level_comments: Vec::new(),
            num_top_level_comments: self.num_top_level_comments,
        }
    }
}

/// Posts per category, serialized as a JSON object keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(BTreeMap<Category, Vec<PostData>>);

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, posts: Vec<PostData>) {
        self.0.insert(category, posts);
    }

    pub fn posts(&self, category: Category) -> &[PostData] {
        self.0.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[PostData])> {
        self.0.iter().map(|(category, posts)| (*category, posts.as_slice()))
    }

    /// The published "small" variant: same posts, comment bodies dropped.
    pub fn small(&self) -> Dataset {
        Dataset(
            self.0
                .iter()
                .map(|(category, posts)| {
                    (*category, posts.iter().map(PostData::without_comments).collect())
                })
                .collect(),
        )
    }
}

impl FromIterator<(Category, Vec<PostData>)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (Category, Vec<PostData>)>>(iter: I) -> Self {
        Dataset(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> PostData {
        PostData::new(
            42,
            1_700_000_000,
            "Ask HN: Who is hiring? (November 2023)",
            vec![Comment::new("Acme | Rust | Remote"), Comment::new("Globex | Go")],
        )
    }

    #[test]
    fn test_post_data_construction() {
        let post = sample_post();
        assert_eq!(post.timestamp_ms(), 1_700_000_000_000);
        assert_eq!(post.url(), "https://news.ycombinator.com/item?id=42");
        assert_eq!(post.num_top_level_comments(), post.top_level_comments().len());
        assert_eq!(post.num_top_level_comments(), 2);
    }

    #[test]
    fn test_post_data_wire_format() {
        let value = serde_json::to_value(sample_post()).unwrap();
        assert_eq!(value["timestampMs"], 1_700_000_000_000i64);
        assert_eq!(value["numTopLevelComments"], 2);
        assert_eq!(value["topLevelComments"][0]["text"], "Acme | Rust | Remote");
        assert_eq!(value["url"], "https://news.ycombinator.com/item?id=42");
    }

    #[test]
    fn test_without_comments_keeps_count() {
        let small = sample_post().without_comments();
        assert!(small.top_level_comments().is_empty());
        assert_eq!(small.num_top_level_comments(), 2);
        assert_eq!(small.title(), "Ask HN: Who is hiring? (November 2023)");
    }

    #[test]
    fn test_small_dataset_is_structural_copy() {
        let dataset: Dataset = Category::ALL
            .into_iter()
            .map(|category| (category, vec![sample_post()]))
            .collect();
        let small = dataset.small();

        assert_eq!(
            dataset.categories().collect::<Vec<_>>(),
            small.categories().collect::<Vec<_>>()
        );
        for (category, posts) in dataset.iter() {
            let small_posts = small.posts(category);
            assert_eq!(posts.len(), small_posts.len());
            for (full, stripped) in posts.iter().zip(small_posts) {
                assert_eq!(full.timestamp_ms(), stripped.timestamp_ms());
                assert_eq!(full.url(), stripped.url());
                assert_eq!(full.title(), stripped.title());
                assert_eq!(full.num_top_level_comments(), stripped.num_top_level_comments());
                assert!(stripped.top_level_comments().is_empty());
            }
        }
    }

    #[test]
    fn test_dataset_keys_in_category_order() {
        let dataset: Dataset = Category::ALL
            .into_iter()
            .rev()
            .map(|category| (category, Vec::new()))
            .collect();
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(
            json,
            r#"{"hiring":[],"looking":[],"hiringFreelancer":[],"freelancerLooking":[]}"#
        );
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("hiringFreelancer".parse::<Category>().unwrap(), Category::HiringFreelancer);
        assert!("freelancer".parse::<Category>().is_err());
        assert_eq!(Category::FreelancerLooking.to_string(), "freelancerLooking");
    }
}
