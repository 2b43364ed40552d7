//! Post visibility.
//!
//! A post is publicly visible when it is published, its category (if any) is
//! published, and its publication date has been reached. Authors always see
//! their own posts.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Category, PostRecord};

/// How a feed is built from a set of post records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    /// Attach comment counts to each item.
    pub annotate: bool,
    /// Drop records the viewer is not allowed to see.
    pub restrict_to_public: bool,
}

impl FeedOptions {
    /// Public listing: annotated and restricted.
    pub const PUBLIC: Self = Self {
        annotate: true,
        restrict_to_public: true,
    };

    /// Owner listing: annotated, nothing hidden.
    pub const OWNER: Self = Self {
        annotate: true,
        restrict_to_public: false,
    };
}

/// One entry of a feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub record: PostRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
}

/// The public visibility rule. A missing category counts as published.
pub fn is_publicly_visible(
    post: &crate::domain::Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> bool {
    post.is_published && category.is_none_or(|c| c.is_published) && post.pub_date <= now
}

/// Whether `viewer` may see the post in `record`.
pub fn can_view(record: &PostRecord, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
    viewer == Some(record.post.author_id)
        || is_publicly_visible(&record.post, record.category.as_ref(), now)
}

/// Newest `pub_date` first; ties broken by creation time, then id, so the
/// order never depends on the input order.
fn newest_first(a: &PostRecord, b: &PostRecord) -> Ordering {
    b.post
        .pub_date
        .cmp(&a.post.pub_date)
        .then_with(|| b.post.created_at.cmp(&a.post.created_at))
        .then_with(|| a.post.id.cmp(&b.post.id))
}

/// Select the records `viewer` may see (when restricted), order them newest
/// first, and optionally annotate them with their comment counts.
pub fn filter_annotate(
    records: Vec<PostRecord>,
    options: FeedOptions,
    viewer: Option<Uuid>,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let mut records: Vec<PostRecord> = if options.restrict_to_public {
        records
            .into_iter()
            .filter(|r| can_view(r, viewer, now))
            .collect()
    } else {
        records
    };

    records.sort_by(newest_first);

    records
        .into_iter()
        .map(|record| FeedItem {
            comment_count: options.annotate.then_some(record.comment_count),
            record,
        })
        .collect()
}
