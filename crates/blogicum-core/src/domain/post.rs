use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Location};

/// Post entity - a blog entry, possibly scheduled for a future `pub_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Path of the attached image, relative to the media root.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new published post without category, location or image.
    pub fn new(author_id: Uuid, title: String, text: String, pub_date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            text,
            pub_date,
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post together with the relations needed to decide its visibility and
/// to render it: author name, category, location and comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub post: Post,
    pub author_username: String,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
