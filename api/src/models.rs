use axum::{
    extract::{FromRequest, FromRequestParts},
    Json,
};
use chrono::{DateTime, Utc};
use database::{ApiKey, IssuedApiKey, Project};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use user::{Identity, Role};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_API_KEY_NAME_LEN: usize = 64;

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections use the API error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query extractor whose rejections use the API error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "member")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            name: identity.name,
            role: identity.role,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    /// Defaults to `member`
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            owner_id: project.owner_id,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for listing projects
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    pub owner_id: Option<String>,
}

// ============================================================================
// API keys
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub prefix: String,
    pub created_at: DateTime<Utc>,
    /// Only present in the response to the creating request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            name: key.name,
            owner_id: key.owner_id,
            prefix: key.prefix,
            created_at: key.created_at,
            secret: None,
        }
    }
}

impl From<IssuedApiKey> for ApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        Self {
            secret: Some(issued.secret),
            ..Self::from(issued.key)
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub session_id: String,
    pub permissions: Vec<String>,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub users: usize,
    pub projects: usize,
    pub api_keys: usize,
}

// ============================================================================
// Validation
// ============================================================================

/// Trims `value` and checks its length is within `1..=max` characters.
pub fn validate_text(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::ValidationError(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

pub fn validate_name(value: &str) -> ApiResult<String> {
    validate_text("name", value, MAX_NAME_LEN)
}

pub fn validate_api_key_name(value: &str) -> ApiResult<String> {
    validate_text("name", value, MAX_API_KEY_NAME_LEN)
}

pub fn validate_description(value: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::ValidationError(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(value.to_string())
}

pub fn validate_email(value: &str) -> ApiResult<String> {
    let email = validate_text("email", value, MAX_EMAIL_LEN)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::ValidationError(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

pub fn parse_role(value: &str) -> ApiResult<Role> {
    Role::from_str(value).map_err(|e| ApiError::ValidationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice@example.com")]
    #[case("  bob@example.org ")]
    #[case("a@b")]
    fn test_valid_emails(#[case] email: &str) {
        assert_eq!(validate_email(email).unwrap(), email.trim());
    }

    #[rstest]
    #[case("")]
    #[case("alice")]
    #[case("@example.com")]
    #[case("alice@")]
    #[case("a@b@c")]
    #[case("al ice@example.com")]
    fn test_invalid_emails(#[case] email: &str) {
        assert!(matches!(
            validate_email(email),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_name_limits() {
        assert_eq!(validate_name("  Apollo ").unwrap(), "Apollo");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
        assert!(validate_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_description_may_be_empty() {
        assert_eq!(validate_description("").unwrap(), "");
        assert!(validate_description(&"d".repeat(501)).is_err());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("viewer").unwrap(), Role::Viewer);
        assert!(matches!(
            parse_role("root"),
            Err(ApiError::ValidationError(msg)) if msg == "Unknown role: root"
        ));
    }

    #[test]
    fn test_issued_key_response_carries_secret_once() {
        let issued = IssuedApiKey {
            key: ApiKey {
                id: "key_1".into(),
                name: "ci".into(),
                owner_id: "usr_alice".into(),
                prefix: "tk_abcdefgh".into(),
                created_at: Utc::now(),
            },
            secret: "tk_abcdefghijkl".into(),
        };
        let listed = ApiKeyResponse::from(issued.key.clone());
        assert!(listed.secret.is_none());
        let created = ApiKeyResponse::from(issued);
        assert_eq!(created.secret.as_deref(), Some("tk_abcdefghijkl"));
    }
}
