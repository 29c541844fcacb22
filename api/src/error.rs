use authz::Denial;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use database::DatabaseError;
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;
use tracing::error;
use user::{AuthError, UserError};

/// API Error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// An access-control check failed; 401 or 403 depending on the denial
    #[error("{0}")]
    Denied(Denial),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    /// Machine-readable denial reason, e.g. `not_owner`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Denied(denial) if denial.is_unauthorized() => StatusCode::UNAUTHORIZED,
            ApiError::Denied(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for the error type
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::Denied(denial) if denial.is_unauthorized() => "UNAUTHORIZED",
            ApiError::Denied(_) => "FORBIDDEN",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Denied(Denial::Unauthorized(reason)) => reason.to_string(),
            ApiError::Denied(Denial::Forbidden(reason)) => reason.to_string(),
            ApiError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::InternalError(details) = &self {
            error!("Internal error: {}", details);
        }

        let status = self.status_code();
        let reason = match &self {
            ApiError::Denied(denial) => Some(denial.code().to_string()),
            _ => None,
        };
        let error_response = ApiErrorResponse {
            success: false,
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.message(),
                reason,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        ApiError::Denied(denial)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            // Token failures reach handlers only through the middleware,
            // which already collapsed them into a denial.
            AuthError::MalformedToken(_) | AuthError::UserNotFound(_) => {
                ApiError::Denied(Denial::Unauthorized(authz::UnauthorizedReason::InvalidToken))
            }
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserNotFound(id) => ApiError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(_) | UserError::DuplicateId(_) => {
                ApiError::Conflict(err.to_string())
            }
            UserError::Validation(msg) => ApiError::ValidationError(msg),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ProjectNotFound(id) => {
                ApiError::NotFound(format!("Project {} not found", id))
            }
            DatabaseError::ApiKeyNotFound(id) => {
                ApiError::NotFound(format!("API key {} not found", id))
            }
            DatabaseError::Validation(msg) => ApiError::ValidationError(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Router fallback for paths that match no route
pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}

/// Turns a handler panic into a 500 inside the error envelope
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    ApiError::InternalError(details).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz::{ForbiddenReason, UnauthorizedReason};
    use rstest::rstest;

    #[test]
    fn test_denial_status_mapping() {
        let err = ApiError::from(Denial::Unauthorized(UnauthorizedReason::MissingHeader));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "UNAUTHORIZED");

        let err = ApiError::from(Denial::Forbidden(ForbiddenReason::NotOwner));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert_eq!(err.message(), "only the owner or an admin may do this");
    }

    #[test]
    fn test_storage_errors() {
        let err = ApiError::from(UserError::DuplicateEmail("a@b.c".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = ApiError::from(DatabaseError::ProjectNotFound("prj_1".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Project prj_1 not found");
    }

    #[test]
    fn test_login_failure_is_unauthorized() {
        let err = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ApiError::InternalError("lock poisoned".into());
        assert_eq!(err.message(), "Internal server error");
    }

    #[rstest]
    #[case(Box::new("boom"))]
    #[case(Box::new(String::from("index out of bounds")))]
    #[case(Box::new(42_u8))]
    fn test_panic_response_is_opaque_500(#[case] payload: Box<dyn Any + Send + 'static>) {
        let response = panic_response(payload);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
