//! Core authorization types: permissions, decisions and denial reasons.
//!
//! Every denial carries a stable, machine-readable reason code. The HTTP
//! layer picks the status (401 vs 403) from the denial kind; nothing here
//! formats a response.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// An atomic capability string such as `"read"` or `"manage:users"`.
///
/// Matching is exact: there are no wildcards and no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const READ: Permission = Permission(Cow::Borrowed("read"));
    pub const WRITE: Permission = Permission(Cow::Borrowed("write"));
    pub const DELETE: Permission = Permission(Cow::Borrowed("delete"));
    pub const MANAGE_USERS: Permission = Permission(Cow::Borrowed("manage:users"));
    pub const MANAGE_API_KEYS: Permission = Permission(Cow::Borrowed("manage:api-keys"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a request could not be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    MissingHeader,
    WrongScheme,
    InvalidToken,
}

impl UnauthorizedReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::WrongScheme => "wrong_scheme",
            Self::InvalidToken => "invalid_token",
        }
    }
}

impl fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::MissingHeader => "missing authorization header",
            Self::WrongScheme => "authorization scheme must be Bearer",
            Self::InvalidToken => "invalid or expired session token",
        };
        f.write_str(message)
    }
}

/// Why an authenticated caller may not perform an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForbiddenReason {
    PermissionDenied(Permission),
    NotOwner,
    RoleChangeDenied,
    SelfDeleteDenied,
}

impl ForbiddenReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::NotOwner => "not_owner",
            Self::RoleChangeDenied => "role_change_denied",
            Self::SelfDeleteDenied => "self_delete_denied",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied(permission) => {
                write!(f, "missing permission '{}'", permission)
            }
            Self::NotOwner => f.write_str("only the owner or an admin may do this"),
            Self::RoleChangeDenied => f.write_str("only an admin may change roles"),
            Self::SelfDeleteDenied => f.write_str("you cannot delete your own account"),
        }
    }
}

/// The reason attached to a `Decision::Deny`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),

    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenReason),
}

impl Denial {
    /// Stable reason code, e.g. `"not_owner"`.
    pub fn code(&self) -> &'static str {
        match self {
            Denial::Unauthorized(reason) => reason.code(),
            Denial::Forbidden(reason) => reason.code(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Denial::Unauthorized(_))
    }
}

/// Outcome of a single authorization check.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn forbid(reason: ForbiddenReason) -> Self {
        Decision::Deny(Denial::Forbidden(reason))
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts into a `Result` so checks compose with `?`.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_constants() {
        assert_eq!(Permission::READ.as_str(), "read");
        assert_eq!(Permission::MANAGE_USERS.to_string(), "manage:users");
        assert_eq!(Permission::new("manage:users"), Permission::MANAGE_USERS);
        assert_eq!(
            serde_json::to_string(&Permission::MANAGE_API_KEYS).unwrap(),
            "\"manage:api-keys\""
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            Denial::Unauthorized(UnauthorizedReason::WrongScheme).code(),
            "wrong_scheme"
        );
        assert_eq!(
            Denial::Forbidden(ForbiddenReason::PermissionDenied(Permission::WRITE)).code(),
            "permission_denied"
        );
        assert_eq!(
            Denial::Forbidden(ForbiddenReason::SelfDeleteDenied).to_string(),
            "Forbidden: you cannot delete your own account"
        );
    }

    #[test]
    fn test_decision_into_result() {
        assert_eq!(Decision::Allow.into_result(), Ok(()));
        let denied = Decision::forbid(ForbiddenReason::NotOwner);
        assert!(!denied.is_allowed());
        assert_eq!(
            denied.into_result(),
            Err(Denial::Forbidden(ForbiddenReason::NotOwner))
        );
    }
}
