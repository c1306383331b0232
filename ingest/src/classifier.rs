//! Which threads and which comments belong to each category.
//!
//! Both freelancer categories read the same monthly "Freelancer? Seeking
//! freelancer?" thread; they differ only in how a comment opens.

use hn_client::SearchIndex;
use tracing::{debug, warn};
use trends_core::Category;

/// Title and comment predicates for one category. Predicates receive
/// lowercased text.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    title: fn(&str) -> bool,
    comment: Option<fn(&str) -> bool>,
}

impl ClassificationRule {
    pub fn admits_title(&self, title: &str) -> bool {
        (self.title)(&title.to_lowercase())
    }

    /// Comments are admitted unless the category has a comment predicate.
    pub fn admits_comment(&self, text: &str) -> bool {
        match self.comment {
            Some(predicate) => predicate(&text.to_lowercase()),
            None => true,
        }
    }
}

fn is_who_is_hiring(title: &str) -> bool {
    title.starts_with("ask hn: who is hiring?")
}

fn is_who_wants_to_be_hired(title: &str) -> bool {
    title.starts_with("ask hn: who wants to be hired?")
}

fn is_freelancer_thread(title: &str) -> bool {
    title.contains("freelancer")
}

fn is_seeking_freelancer(comment: &str) -> bool {
    comment.starts_with("seeking freelancer")
}

fn is_seeking_work(comment: &str) -> bool {
    comment.starts_with("seeking work")
}

static HIRING: ClassificationRule = ClassificationRule {
    title: is_who_is_hiring,
    comment: None,
};

static LOOKING: ClassificationRule = ClassificationRule {
    title: is_who_wants_to_be_hired,
    comment: None,
};

static HIRING_FREELANCER: ClassificationRule = ClassificationRule {
    title: is_freelancer_thread,
    comment: Some(is_seeking_freelancer),
};

static FREELANCER_LOOKING: ClassificationRule = ClassificationRule {
    title: is_freelancer_thread,
    comment: Some(is_seeking_work),
};

pub fn rule(category: Category) -> &'static ClassificationRule {
    match category {
        Category::Hiring => &HIRING,
        Category::Looking => &LOOKING,
        Category::HiringFreelancer => &HIRING_FREELANCER,
        Category::FreelancerLooking => &FREELANCER_LOOKING,
    }
}

/// Ids of the threads in `index` whose title matches `category`, in index
/// order.
pub fn classify(index: &SearchIndex, category: Category) -> Vec<u64> {
    let rule = rule(category);
    let post_ids: Vec<u64> = index
        .hits
        .iter()
        .filter(|hit| rule.admits_title(hit.title.as_deref().unwrap_or_default()))
        .filter_map(|hit| {
            let post_id = hit.post_id();
            if post_id.is_none() {
                warn!(object_id = %hit.object_id, "Skipping hit with non-numeric id");
            }
            post_id
        })
        .collect();

    debug!(%category, count = post_ids.len(), "Classified candidate threads");
    post_ids
}
