//! Authentication extractors.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use uuid::Uuid;

use blogicum_core::Actor;
use blogicum_core::ports::{AuthError, TokenClaims, TokenService};
use blogicum_core::urls;
use blogicum_shared::ErrorResponse;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
/// Requests without credentials are sent to the login page.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

impl Identity {
    /// The identity as the acting user of a use case.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.username.clone())
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError {
    pub error: AuthError,
    /// Path of the rejected request, to come back to after login.
    pub next: String,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            AuthError::MissingAuth => StatusCode::SEE_OTHER,
            AuthError::TokenExpired | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match &self.error {
            AuthError::MissingAuth => {
                let login = urls::login(&self.next);
                let problem = ErrorResponse::new(303, "Authentication Required")
                    .with_detail("Please log in to continue.")
                    .with_instance(login.clone());
                HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, login))
                    .json(problem)
            }
            AuthError::TokenExpired => HttpResponse::Unauthorized().json(
                ErrorResponse::new(401, "Token Expired")
                    .with_detail("Your authentication token has expired. Please login again."),
            ),
            AuthError::InvalidToken(msg) => HttpResponse::Unauthorized()
                .json(ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())),
            _ => HttpResponse::InternalServerError().json(ErrorResponse::internal_error()),
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let Some(token_service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()));
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    token_service.validate_token(token.trim()).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|error| AuthenticationError {
            error,
            next: req.path().to_string(),
        }))
    }
}

/// Optional identity extractor - anonymous when no valid token is sent.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn actor(&self) -> Option<Actor> {
        self.0.as_ref().map(Identity::actor)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}
