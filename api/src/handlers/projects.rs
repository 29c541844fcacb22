use authz::Permission;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use database::{NewProject, ProjectUpdate};
use tracing::info;

use crate::{
    error::ApiResult,
    middleware_hooks::CurrentUser,
    models::{
        validate_description, validate_name, ApiJson, ApiPath, ApiQuery, ApiResponse,
        CreateProjectRequest, ProjectListParams, ProjectResponse, UpdateProjectRequest,
    },
    AppState,
};

/// List projects, optionally filtered by owner
/// GET /api/v1/projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(("owner_id" = Option<String>, Query, description = "Only projects owned by this user")),
    responses(
        (status = 200, description = "Projects listed", body = [ProjectResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiQuery(params): ApiQuery<ProjectListParams>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::READ)
        .into_result()?;

    let projects = match params.owner_id.as_deref() {
        Some(owner_id) => state.db.projects().list_by_owner(owner_id).await,
        None => state.db.projects().list().await,
    };

    Ok(ApiResponse::ok(
        projects
            .into_iter()
            .map(ProjectResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET /api/v1/projects/{id}
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 404, description = "Project not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::READ)
        .into_result()?;

    let project = state.db.projects().get(&id).await?;
    Ok(ApiResponse::ok(ProjectResponse::from(project)))
}

/// Create a project owned by the caller
/// POST /api/v1/projects
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 403, description = "Missing write permission", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::WRITE)
        .into_result()?;

    let name = validate_name(&req.name)?;
    let description = validate_description(req.description.as_deref().unwrap_or_default())?;

    let project = state
        .db
        .projects()
        .create(NewProject::new(name, description, ctx.identity_id.as_str()))
        .await?;
    info!("Project {} created by {}", project.id, ctx.identity_id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(ProjectResponse::from(project)),
    ))
}

/// Update a project
/// PATCH /api/v1/projects/{id}
///
/// Requires `write` and ownership of the project, unless the caller is an
/// admin.
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "Project not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<UpdateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::WRITE)
        .into_result()?;

    let existing = state.db.projects().get(&id).await?;
    state
        .authz
        .require_owner_or_admin(&ctx, &existing.owner_id)
        .into_result()?;

    let update = ProjectUpdate {
        name: req.name.as_deref().map(validate_name).transpose()?,
        description: req
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?,
    };

    let project = state.db.projects().update(&id, update).await?;
    info!("Project {} updated by {}", project.id, ctx.identity_id);

    Ok(ApiResponse::ok(ProjectResponse::from(project)))
}

/// DELETE /api/v1/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = ProjectResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "Project not found", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .require_permission(&ctx, &Permission::DELETE)
        .into_result()?;

    let existing = state.db.projects().get(&id).await?;
    state
        .authz
        .require_owner_or_admin(&ctx, &existing.owner_id)
        .into_result()?;

    let project = state.db.projects().delete(&id).await?;
    info!("Project {} deleted by {}", project.id, ctx.identity_id);

    Ok(ApiResponse::ok(ProjectResponse::from(project)))
}
