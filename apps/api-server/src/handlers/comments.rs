//! Comment handlers. Editing and deleting is reserved to the comment's author.

use actix_web::{HttpResponse, web};
use serde_json::json;
use uuid::Uuid;

use blogicum_core::forms::CommentForm;
use blogicum_shared::dto::CommentRequest;

use super::{current_actor, see_other, views};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let form = CommentForm {
        text: body.into_inner().text,
    };
    let outcome = state.blog.add_comment(&actor, *post_id, form).await?;

    Ok(see_other(
        &outcome.redirect_to,
        views::comment(&outcome.value, &actor.username),
    ))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let actor = current_actor(&state, &identity).await?;
    let comment = state
        .blog
        .comment_for_edit(&actor, post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(views::comment(&comment, &actor.username)))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let actor = current_actor(&state, &identity).await?;
    let form = CommentForm {
        text: body.into_inner().text,
    };
    let outcome = state
        .blog
        .update_comment(&actor, post_id, comment_id, form)
        .await?;

    Ok(see_other(
        &outcome.redirect_to,
        views::comment(&outcome.value, &actor.username),
    ))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    edit_form(state, identity, path).await
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let actor = current_actor(&state, &identity).await?;
    let outcome = state
        .blog
        .delete_comment(&actor, post_id, comment_id)
        .await?;

    Ok(see_other(&outcome.redirect_to, json!({ "deleted": outcome.value })))
}
