//! Identity types shared by the directory, the token codec and the
//! authorization engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed set of roles an identity can hold.
///
/// Roles are not ordered by privilege. What each role may do is decided by
/// the permission table in the `authz` crate, never by comparing roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
    Viewer,
}

impl Role {
    /// Every enumerated role, used to validate lookup tables keyed by role.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Member, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// An authenticated principal as stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Builds an identity with a caller-chosen id. Used for seeding and tests.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of resolving a bearer token: who is calling, and under which session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub identity_id: String,
    pub identity: Identity,
    pub session_id: String,
}

impl AuthContext {
    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn is_admin(&self) -> bool {
        self.identity.role.is_admin()
    }
}

/// Data required to register a new identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentity {
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Partial update of an identity; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Member ".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("VIEWER".parse::<Role>().unwrap(), Role::Viewer);
        assert_eq!(
            "owner".parse::<Role>().unwrap_err(),
            RoleParseError("owner".to_string())
        );
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"viewer\"").unwrap();
        assert_eq!(role, Role::Viewer);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn test_auth_context_helpers() {
        let ctx = AuthContext {
            identity_id: "usr_admin".to_string(),
            identity: Identity::new("usr_admin", "admin@example.com", "Admin", Role::Admin),
            session_id: "abc".to_string(),
        };
        assert!(ctx.is_admin());
        assert_eq!(ctx.role(), Role::Admin);
    }
}
