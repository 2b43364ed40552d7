//! Authentication handlers.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use blogicum_core::domain::User;
use blogicum_core::forms::RegistrationForm;
use blogicum_core::ports::TokenService;
use blogicum_core::urls;
use blogicum_shared::dto::{AuthResponse, LoginRequest, RegisterRequest};

use super::{see_other, views};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn issue_token(tokens: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = tokens.generate_token(user.id, &user.username)?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /auth/registration/
///
/// Creates the account and signs it in; the client lands on the index.
pub async fn register(
    state: web::Data<AppState>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .blog
        .register(RegistrationForm {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    let auth = issue_token(tokens.get_ref().as_ref(), &user)?;
    Ok(see_other(&urls::index(), auth))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    tokens: web::Data<Arc<dyn TokenService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state.blog.authenticate(&req.username, &req.password).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok().json(issue_token(tokens.get_ref().as_ref(), &user)?))
}

/// GET /auth/me/ - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.blog.current_user(&identity.actor()).await?;

    Ok(HttpResponse::Ok().json(views::user(&user)))
}
