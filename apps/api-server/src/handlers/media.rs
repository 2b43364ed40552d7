//! Serving uploaded files.

use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET {MEDIA_URL}/{path}
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let data = state.media.read(&path).await?;
    let mime = mime_guess::from_path(path.as_str()).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, mime.essence_str().to_string()))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(data))
}
