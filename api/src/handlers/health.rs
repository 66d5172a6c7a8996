use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use tracing::debug;

use crate::{models::HealthResponse, AppState};

/// Health check endpoint
///
/// GET /api/v1/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    debug!(
        token_header = %state.authorizer.config().token_header,
        "Health check requested"
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
