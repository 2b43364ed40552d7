//! Paginated post listings.

use actix_web::{HttpResponse, web};

use blogicum_shared::dto::{CategoryFeedResponse, ProfileFeedResponse};

use super::{PageQuery, views};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.blog.index(query.number()).await?;

    Ok(HttpResponse::Ok().json(views::feed(page, &state.media_url)))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = state.blog.category_posts(&slug, query.number()).await?;

    Ok(HttpResponse::Ok().json(CategoryFeedResponse {
        category: views::category(&feed.category),
        posts: views::feed(feed.page, &state.media_url),
    }))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let viewer = identity.actor();
    let feed = state
        .blog
        .profile(&username, viewer.as_ref(), query.number())
        .await?;

    Ok(HttpResponse::Ok().json(ProfileFeedResponse {
        profile: views::profile(&feed.profile),
        posts: views::feed(feed.page, &state.media_url),
    }))
}
