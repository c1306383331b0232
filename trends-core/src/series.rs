//! Chart series derived from a published dataset.
//!
//! Mirrors what the front end plots: one point per thread, optionally
//! counting only comments that mention a filter term, plus a trailing
//! moving average.

use serde::Serialize;

use crate::{Category, Comment, Dataset, PostData};

/// Window the front end smooths with.
pub const DEFAULT_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: i64,
    pub y: f64,
}

/// `filter` is a comma separated list of terms; a comment matches when its
/// text contains any of them, ignoring case. An empty filter matches all.
pub fn comment_matches(comment: &Comment, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let text = comment.text.to_lowercase();
    filter
        .split(',')
        .any(|term| text.contains(&term.trim().to_lowercase()))
}

/// With an empty filter the stored count is used, so this also works on the
/// small dataset where comment bodies are stripped.
pub fn count_series(posts: &[PostData], filter: &str) -> Vec<Point> {
    posts
        .iter()
        .map(|post| {
            let y = if filter.is_empty() {
                post.num_top_level_comments()
            } else {
                post.top_level_comments()
                    .iter()
                    .filter(|comment| comment_matches(comment, filter))
                    .count()
            };
            Point {
                x: post.timestamp_ms(),
                y: y as f64,
            }
        })
        .collect()
}

/// Mean of each point and up to `window - 1` points before it.
pub fn moving_average_from_right(points: &[Point], window: usize) -> Vec<Point> {
    let window = window.max(1);
    let mut sum = 0.0;
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            sum += point.y;
            if i >= window {
                sum -= points[i - window].y;
            }
            Point {
                x: point.x,
                y: sum / window.min(i + 1) as f64,
            }
        })
        .collect()
}

/// One plotted thread: its publication date, the raw count and the
/// smoothed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRow {
    pub timestamp_ms: i64,
    pub date: String,
    pub raw: f64,
    pub smoothed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub category: Category,
    pub label: &'static str,
    pub filter: String,
    pub window: usize,
    pub rows: Vec<SeriesRow>,
}

pub fn series_report(
    dataset: &Dataset,
    category: Category,
    filter: &str,
    window: usize,
) -> SeriesReport {
    let posts = dataset.posts(category);
    let raw = count_series(posts, filter);
    let smoothed = moving_average_from_right(&raw, window);

    let rows = posts
        .iter()
        .zip(raw.iter().zip(&smoothed))
        .map(|(post, (raw, smoothed))| SeriesRow {
            timestamp_ms: raw.x,
            date: post
                .published_at()
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            raw: raw.y,
            smoothed: smoothed.y,
        })
        .collect();

    SeriesReport {
        category,
        label: category.label(),
        filter: filter.to_string(),
        window,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(ts: i64, comments: &[&str]) -> PostData {
        PostData::new(1, ts, "t", comments.iter().map(|c| Comment::new(*c)).collect())
    }

    #[test]
    fn test_comment_filter_terms() {
        let comment = Comment::new("Acme | Senior Rust Engineer | REMOTE");
        assert!(comment_matches(&comment, ""));
        assert!(comment_matches(&comment, "rust"));
        assert!(comment_matches(&comment, "python, remote"));
        assert!(!comment_matches(&comment, "python,golang"));
    }

    #[test]
    fn test_count_series_uses_stored_count_without_filter() {
        let posts = vec![post(1, &["a", "b"]), post(2, &["rust"])];
        let small: Vec<PostData> = posts.iter().map(PostData::without_comments).collect();

        let series = count_series(&small, "");
        assert_eq!(series, vec![Point { x: 1000, y: 2.0 }, Point { x: 2000, y: 1.0 }]);

        let filtered = count_series(&posts, "rust");
        assert_eq!(filtered[0].y, 0.0);
        assert_eq!(filtered[1].y, 1.0);
    }

    #[test]
    fn test_moving_average_from_right() {
        let points: Vec<Point> = [2.0, 4.0, 6.0, 8.0]
            .iter()
            .enumerate()
            .map(|(i, y)| Point { x: i as i64, y: *y })
            .collect();

        let smoothed = moving_average_from_right(&points, 2);
        let ys: Vec<f64> = smoothed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![2.0, 3.0, 5.0, 7.0]);
        assert_eq!(smoothed[3].x, 3);

        assert!(moving_average_from_right(&[], DEFAULT_WINDOW).is_empty());
    }

    #[test]
    fn test_series_report_rows() {
        let dataset: Dataset = [(
            Category::HiringFreelancer,
            vec![
                post(1_709_251_200, &["Seeking freelancer | Rust", "Seeking freelancer | Go"]),
                post(1_711_929_600, &["Seeking freelancer | Rust"]),
            ],
        )]
        .into_iter()
        .collect();

        let report = series_report(&dataset, Category::HiringFreelancer, "rust", 2);

        assert_eq!(report.label, "Hiring Freelancer");
        assert_eq!(report.window, 2);
        assert_eq!(
            report.rows,
            vec![
                SeriesRow {
                    timestamp_ms: 1_709_251_200_000,
                    date: "2024-03-01".to_string(),
                    raw: 1.0,
                    smoothed: 1.0,
                },
                SeriesRow {
                    timestamp_ms: 1_711_929_600_000,
                    date: "2024-04-01".to_string(),
                    raw: 1.0,
                    smoothed: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_series_report_for_missing_category_is_empty() {
        let report = series_report(&Dataset::new(), Category::Looking, "", DEFAULT_WINDOW);

        assert_eq!(report.label, "Looking");
        assert!(report.rows.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["category"], "looking");
        assert_eq!(json["rows"], serde_json::json!([]));
    }
}
