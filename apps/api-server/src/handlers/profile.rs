//! Editing one's own profile.

use actix_web::{HttpResponse, web};

use blogicum_core::forms::ProfileForm;
use blogicum_shared::dto::ProfileRequest;

use super::{current_actor, see_other, views};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/edit/
pub async fn show(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.blog.current_user(&identity.actor()).await?;

    Ok(HttpResponse::Ok().json(views::user(&user)))
}

/// POST /profile/edit/
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileRequest>,
) -> AppResult<HttpResponse> {
    let actor = current_actor(&state, &identity).await?;
    let req = body.into_inner();
    let form = ProfileForm {
        username: req.username,
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let outcome = state.blog.update_profile(&actor, form).await?;
    if outcome.value.username != actor.username {
        tracing::info!(user_id = %actor.id, "Username changed");
    }

    Ok(see_other(&outcome.redirect_to, views::user(&outcome.value)))
}
