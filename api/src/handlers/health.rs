use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use tracing::debug;

use crate::{
    error::ApiResult,
    models::{ApiResponse, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    debug!("Health check requested");

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        users: state.users.database().count().await,
        projects: state.db.projects().count().await,
        api_keys: state.db.api_keys().count().await,
    };

    Ok(ApiResponse::ok(response))
}
