//! Post detail and author-only post mutations.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::StreamExt;
use serde_json::json;
use uuid::Uuid;

use blogicum_core::forms::PostForm;
use blogicum_core::ports::MediaUpload;
use blogicum_shared::FieldErrorResponse;
use blogicum_shared::dto::{PostDetailResponse, PostRequest};

use super::{current_actor, see_other, views};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

fn post_form(req: PostRequest) -> PostForm {
    PostForm {
        title: req.title,
        text: req.text,
        pub_date: req.pub_date,
        is_published: req.is_published,
        category_id: req.category_id,
        location_id: req.location_id,
    }
}

/// GET /posts/{post_id}/
pub async fn detail(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let viewer = identity.actor();
    let detail = state.blog.post_detail(*post_id, viewer.as_ref()).await?;

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: views::post(&detail.record, None, &state.media_url),
        comments: detail.comments.iter().map(views::comment_record).collect(),
    }))
}

/// POST /posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let outcome = state
        .blog
        .create_post(&actor, post_form(body.into_inner()))
        .await?;

    let record = state.blog.post_for_edit(&actor, outcome.value.id).await?;
    Ok(see_other(
        &outcome.redirect_to,
        views::post(&record, None, &state.media_url),
    ))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let record = state.blog.post_for_edit(&actor, *post_id).await?;

    Ok(HttpResponse::Ok().json(views::post(&record, None, &state.media_url)))
}

/// POST /posts/{post_id}/edit/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let outcome = state
        .blog
        .update_post(&actor, *post_id, post_form(body.into_inner()))
        .await?;

    let record = state.blog.post_for_edit(&actor, outcome.value.id).await?;
    Ok(see_other(
        &outcome.redirect_to,
        views::post(&record, None, &state.media_url),
    ))
}

/// GET /posts/{post_id}/delete/ - what would be deleted.
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let record = state.blog.post_for_edit(&actor, *post_id).await?;

    Ok(HttpResponse::Ok().json(views::post(
        &record,
        Some(record.comment_count),
        &state.media_url,
    )))
}

/// POST /posts/{post_id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let outcome = state.blog.delete_post(&actor, *post_id).await?;

    Ok(see_other(&outcome.redirect_to, json!({ "deleted": outcome.value })))
}

fn image_error(message: String) -> AppError {
    AppError::Validation(vec![FieldErrorResponse {
        field: IMAGE_FIELD.to_string(),
        message,
    }])
}

/// Read the image field of a multipart body, refusing to buffer more than
/// `limit` bytes.
async fn read_image(mut payload: Multipart, limit: usize) -> AppResult<MediaUpload> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;

        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        if disposition.get_name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = disposition.get_filename().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
            if data.len() + chunk.len() > limit {
                return Err(image_error(format!(
                    "The file is larger than {} bytes.",
                    limit
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(MediaUpload {
            file_name,
            content_type,
            data,
        });
    }

    Err(image_error("This field is required.".to_string()))
}

/// POST /posts/{post_id}/image/ - multipart upload of the post image.
pub async fn upload_image(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    // Reject strangers before reading the upload.
    state.blog.post_for_edit(&actor, *post_id).await?;

    let upload = read_image(payload, state.max_upload_bytes).await?;
    let outcome = state.blog.attach_image(&actor, *post_id, upload).await?;

    let record = state.blog.post_for_edit(&actor, outcome.value.id).await?;
    Ok(see_other(
        &outcome.redirect_to,
        views::post(&record, None, &state.media_url),
    ))
}
