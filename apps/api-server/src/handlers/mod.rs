//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod feeds;
mod health;
mod media;
mod posts;
mod profile;
mod views;

#[cfg(test)]
mod tests;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};

use blogicum_core::Actor;
use blogicum_shared::ApiResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// `?page=N` of paginated listings. Pages start at 1.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

impl PageQuery {
    pub fn number(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

/// `303 See Other` to `location`, carrying `body` for API clients.
pub(crate) fn see_other<T: Serialize>(location: &str, body: T) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .json(ApiResponse::redirect(body, location))
}

/// The acting user, re-read from storage so a renamed or deleted account is
/// not trusted on the strength of an older token.
pub(crate) async fn current_actor(state: &AppState, identity: &Identity) -> AppResult<Actor> {
    let user = state.blog.current_user(&identity.actor()).await?;
    Ok(Actor::new(user.id, user.username))
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Configure all application routes. Uploaded media is served under
/// `media_url`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, media_url: &str) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/health", web::get().to(health::health_check))
        // Feeds
        .route("/", web::get().to(feeds::index))
        .route("/category/{slug}/", web::get().to(feeds::category_posts))
        .route("/profile/edit/", web::get().to(profile::show))
        .route("/profile/edit/", web::post().to(profile::update))
        .route("/profile/{username}/", web::get().to(feeds::profile))
        // Posts
        .service(
            web::scope("/posts")
                .route("/create/", web::post().to(posts::create))
                .route("/{post_id}/", web::get().to(posts::detail))
                .route("/{post_id}/edit/", web::get().to(posts::edit_form))
                .route("/{post_id}/edit/", web::post().to(posts::update))
                .route("/{post_id}/delete/", web::get().to(posts::delete_form))
                .route("/{post_id}/delete/", web::post().to(posts::delete))
                .route("/{post_id}/image/", web::post().to(posts::upload_image))
                .route("/{post_id}/comment/", web::post().to(comments::create))
                .route(
                    "/{post_id}/edit_comment/{comment_id}/",
                    web::get().to(comments::edit_form),
                )
                .route(
                    "/{post_id}/edit_comment/{comment_id}/",
                    web::post().to(comments::update),
                )
                .route(
                    "/{post_id}/delete_comment/{comment_id}/",
                    web::get().to(comments::delete_form),
                )
                .route(
                    "/{post_id}/delete_comment/{comment_id}/",
                    web::post().to(comments::delete),
                ),
        )
        // Auth routes
        .service(
            web::scope("/auth")
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me)),
        )
        .route(
            &format!("{}/{{path:.*}}", media_url.trim_end_matches('/')),
            web::get().to(media::serve),
        );
}
