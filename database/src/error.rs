use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
