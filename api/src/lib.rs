use authz::AuthzEngine;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use database::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use user::UserManager;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod seed;
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export server functions for convenience
pub use server::{spawn_server, start_server, start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserManager>,
    pub db: Arc<Database>,
    pub authz: Arc<AuthzEngine>,
}

impl AppState {
    pub fn new(users: Arc<UserManager>, db: Arc<Database>, authz: Arc<AuthzEngine>) -> Self {
        Self { users, db, authz }
    }

    /// Empty stores behind the built-in permission table
    pub fn with_builtin_authz() -> authz::Result<Self> {
        Ok(Self::new(
            Arc::new(UserManager::new()),
            Arc::new(Database::new()),
            Arc::new(AuthzEngine::builtin()?),
        ))
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::projects::list_projects,
        handlers::projects::get_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::api_keys::list_api_keys,
        handlers::api_keys::create_api_key,
        handlers::api_keys::delete_api_key,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::UserResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::ProjectResponse,
            models::CreateProjectRequest,
            models::UpdateProjectRequest,
            models::ApiKeyResponse,
            models::CreateApiKeyRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::MeResponse,
            models::MessageResponse,
            models::HealthResponse,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Session tokens"),
        (name = "users", description = "User directory"),
        (name = "projects", description = "Owned projects"),
        (name = "api-keys", description = "Owned API keys"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Trellis API",
        version = "1.0.0",
        description = "Multi-tenant project and user management with role-based access control",
    ),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("session_<user id>_<nonce>")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Everything here requires a resolved bearer token
    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/projects",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(handlers::projects::get_project)
                .patch(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route(
            "/api-keys",
            get(handlers::api_keys::list_api_keys).post(handlers::api_keys::create_api_key),
        )
        .route(
            "/api-keys/:id",
            axum::routing::delete(handlers::api_keys::delete_api_key),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::authentication_middleware,
        ));

    let api_v1 = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/health", get(handlers::health::health_check))
        .merge(protected);

    // Main router
    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .fallback(error::route_not_found)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/login",
            "/api/v1/auth/me",
            "/api/v1/users/{id}",
            "/api/v1/projects",
            "/api/v1/api-keys/{id}",
            "/api/v1/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
