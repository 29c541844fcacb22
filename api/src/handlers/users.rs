//! User directory handlers
//!
//! Ownership fact for a user account is the account itself: the owner of
//! `/users/:id` is `id`.

use authz::Permission;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use user::{IdentityUpdate, NewIdentity, Role};

use crate::{
    error::{ApiError, ApiResult},
    middleware_hooks::CurrentUser,
    models::{
        parse_role, validate_email, validate_name, ApiJson, ApiPath, ApiResponse, CreateUserRequest,
        UpdateUserRequest, UserResponse,
    },
    AppState,
};

/// List all users
/// GET /api/v1/users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users listed", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Missing read permission", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::READ)
        .into_result()?;

    let users: Vec<UserResponse> = state
        .users
        .database()
        .list()
        .await
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(ApiResponse::ok(users))
}

/// Read a single user
/// GET /api/v1/users/{id}
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::READ)
        .into_result()?;

    let identity = state
        .users
        .database()
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    Ok(ApiResponse::ok(UserResponse::from(identity)))
}

/// Create a user
/// POST /api/v1/users
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 403, description = "Missing manage:users", body = ApiErrorResponse),
        (status = 409, description = "Email already registered", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::MANAGE_USERS)
        .into_result()?;

    let new = NewIdentity {
        email: validate_email(&req.email)?,
        name: validate_name(&req.name)?,
        role: match req.role.as_deref() {
            Some(role) => parse_role(role)?,
            None => Role::Member,
        },
    };

    let identity = state.users.database().create(new).await?;
    info!("User {} created by {}", identity.id, ctx.identity_id);

    Ok((StatusCode::CREATED, ApiResponse::ok(UserResponse::from(identity))))
}

/// Update a user
/// PATCH /api/v1/users/{id}
///
/// Users may edit their own profile; admins may edit anyone. Only admins
/// may change a role.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Not the account owner, or role change denied", body = ApiErrorResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    state.authz.require_owner_or_admin(&ctx, &id).into_result()?;

    let target = state
        .users
        .database()
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    let requested_role = req.role.as_deref().map(parse_role).transpose()?;
    state
        .authz
        .require_role_change_allowed(&ctx, target.role, requested_role)
        .into_result()?;

    let update = IdentityUpdate {
        email: req.email.as_deref().map(validate_email).transpose()?,
        name: req.name.as_deref().map(validate_name).transpose()?,
        role: requested_role,
    };

    let identity = state.users.database().update(&id, update).await?;
    info!("User {} updated by {}", identity.id, ctx.identity_id);

    Ok(ApiResponse::ok(UserResponse::from(identity)))
}

/// Delete a user and everything they own
/// DELETE /api/v1/users/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = UserResponse),
        (status = 403, description = "Self-delete or not permitted", body = ApiErrorResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_self_delete_allowed(&ctx, &id)
        .into_result()?;
    state.authz.require_owner_or_admin(&ctx, &id).into_result()?;

    let removed = state.users.database().delete(&id).await?;
    let (projects, keys) = state.db.remove_owned_by(&removed.id).await;
    info!(
        "User {} deleted by {} ({} projects, {} API keys removed)",
        removed.id, ctx.identity_id, projects, keys
    );

    Ok(ApiResponse::ok(UserResponse::from(removed)))
}
