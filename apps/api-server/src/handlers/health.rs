//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: &'static str,
    pub timestamp: String,
}

/// Health check endpoint - returns server status.
///
/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    #[cfg(feature = "postgres")]
    if let Some(db) = &state.db {
        if let Err(e) = db.ping().await {
            tracing::error!(error = %e, "Database ping failed");
            return HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded",
                version: env!("CARGO_PKG_VERSION"),
                storage: state.storage.as_str(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            });
        }
    }

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage.as_str(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
