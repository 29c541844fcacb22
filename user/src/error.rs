use thiserror::Error;

/// Errors raised by the identity directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("User already exists: {0}")]
    DuplicateId(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// A bearer token that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed session token: {reason}")]
    Malformed { reason: &'static str },
}

/// Failures while turning a bearer token or login attempt into an identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    MalformedToken(#[from] TokenError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::UserNotFound(_) => "user_not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
        }
    }
}

pub type Result<T> = std::result::Result<T, UserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TokenError::Malformed {
            reason: "missing prefix",
        };
        assert_eq!(err.to_string(), "Malformed session token: missing prefix");

        let err = AuthError::from(TokenError::Malformed {
            reason: "empty session id",
        });
        assert_eq!(err.to_string(), "Malformed session token: empty session id");
        assert_eq!(err.code(), "malformed_token");

        let err = AuthError::UserNotFound("usr_ghost".into());
        assert_eq!(err.to_string(), "User not found: usr_ghost");
        assert_eq!(err.code(), "user_not_found");
    }
}
