//! API key handlers
//!
//! The full secret is returned once, by the create call. Listings only
//! carry the display prefix.

use authz::Permission;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::{
    error::ApiResult,
    middleware_hooks::CurrentUser,
    models::{
        validate_api_key_name, ApiJson, ApiKeyResponse, ApiPath, ApiResponse, CreateApiKeyRequest,
    },
    AppState,
};

/// List API keys visible to the caller
/// GET /api/v1/api-keys
///
/// Admins see every key; everyone else sees their own.
#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    responses(
        (status = 200, description = "API keys listed", body = [ApiKeyResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "api-keys"
)]
pub async fn list_api_keys(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::READ)
        .into_result()?;

    let keys = if ctx.is_admin() {
        state.db.api_keys().list().await
    } else {
        state.db.api_keys().list_by_owner(&ctx.identity_id).await
    };

    Ok(ApiResponse::ok(
        keys.into_iter()
            .map(ApiKeyResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Issue a new API key for the caller
/// POST /api/v1/api-keys
#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API key issued, secret included", body = ApiKeyResponse),
        (status = 403, description = "Missing manage:api-keys", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "api-keys"
)]
pub async fn create_api_key(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiJson(req): ApiJson<CreateApiKeyRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::MANAGE_API_KEYS)
        .into_result()?;

    let name = validate_api_key_name(&req.name)?;
    let issued = state.db.api_keys().create(&name, &ctx.identity_id).await?;
    info!("API key {} issued to {}", issued.key.id, ctx.identity_id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(ApiKeyResponse::from(issued)),
    ))
}

/// Revoke an API key
/// DELETE /api/v1/api-keys/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/api-keys/{id}",
    params(("id" = String, Path, description = "API key id")),
    responses(
        (status = 200, description = "API key revoked", body = ApiKeyResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "API key not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "api-keys"
)]
pub async fn delete_api_key(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::MANAGE_API_KEYS)
        .into_result()?;

    let existing = state.db.api_keys().get(&id).await?;
    state
        .authz
        .require_owner_or_admin(&ctx, &existing.owner_id)
        .into_result()?;

    let key = state.db.api_keys().delete(&id).await?;
    info!("API key {} revoked by {}", key.id, ctx.identity_id);

    Ok(ApiResponse::ok(ApiKeyResponse::from(key)))
}
