//! Domain values rendered as wire DTOs.

use blogicum_core::domain::{Category, Comment, CommentRecord, Location, PostRecord, User};
use blogicum_core::{FeedItem, Page};
use blogicum_shared::PageResponse;
use blogicum_shared::dto::{
    CategoryResponse, CommentResponse, LocationResponse, PostResponse, ProfileResponse,
    UserResponse,
};

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
    }
}

pub fn location(location: &Location) -> LocationResponse {
    LocationResponse {
        id: location.id,
        name: location.name.clone(),
    }
}

/// Public URL of a stored media file.
pub fn media_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

pub fn post(record: &PostRecord, comment_count: Option<u64>, media_prefix: &str) -> PostResponse {
    let post = &record.post;
    PostResponse {
        id: post.id,
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date,
        is_published: post.is_published,
        author: record.author_username.clone(),
        category: record.category.as_ref().map(category),
        location: record.location.as_ref().map(location),
        image_url: post.image.as_deref().map(|p| media_url(media_prefix, p)),
        comment_count,
        created_at: post.created_at,
    }
}

pub fn comment(comment: &Comment, author: &str) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: author.to_string(),
        text: comment.text.clone(),
        created_at: comment.created_at,
    }
}

pub fn comment_record(record: &CommentRecord) -> CommentResponse {
    comment(&record.comment, &record.author_username)
}

pub fn feed(page: Page<FeedItem>, media_prefix: &str) -> PageResponse<PostResponse> {
    let has_next = page.has_next();
    let has_previous = page.has_previous();
    PageResponse {
        items: page
            .items
            .iter()
            .map(|item| post(&item.record, item.comment_count, media_prefix))
            .collect(),
        page: page.number,
        per_page: page.per_page,
        total_items: page.total_items,
        num_pages: page.num_pages,
        has_next,
        has_previous,
    }
}

pub fn profile(user: &User) -> ProfileResponse {
    ProfileResponse {
        username: user.username.clone(),
        full_name: user.display_name(),
        date_joined: user.created_at,
    }
}

pub fn user(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: user.created_at,
    }
}
