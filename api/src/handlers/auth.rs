//! Session handlers: login, current user, logout

use axum::{extract::State, response::IntoResponse};
use tracing::{debug, info};

use crate::{
    error::ApiResult,
    middleware_hooks::CurrentUser,
    models::{
        validate_email, ApiJson, ApiResponse, LoginRequest, LoginResponse, MeResponse,
        MessageResponse, UserResponse,
    },
    AppState,
};

/// Exchange an email address for a session token
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid email", body = ApiErrorResponse),
        (status = 401, description = "Unknown email", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = validate_email(&req.email)?;
    debug!("Login attempt");

    let (token, identity) = state.users.auth_service().login(&email).await?;

    Ok(ApiResponse::ok(LoginResponse {
        token: token.into_string(),
        user: identity.into(),
    }))
}

/// Get the calling user and their effective permissions
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let permissions = state
        .authz
        .permissions()
        .permissions_for(ctx.role())
        .iter()
        .map(|p| p.to_string())
        .collect();

    Ok(ApiResponse::ok(MeResponse {
        user: UserResponse::from(ctx.identity),
        session_id: ctx.session_id,
        permissions,
    }))
}

/// Logout endpoint
/// POST /api/v1/auth/logout
///
/// Tokens are not stored server side, so there is nothing to revoke: the
/// client is expected to discard its token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(CurrentUser(ctx): CurrentUser) -> ApiResult<impl IntoResponse> {
    info!(
        "User {} logged out of session {}",
        ctx.identity_id, ctx.session_id
    );

    Ok(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}
