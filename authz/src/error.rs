//! Error types for the authorization system.
//!
//! Denials are not errors: they are returned as `Decision::Deny` values.
//! `AuthzError` only covers misconfiguration detected at startup.

use thiserror::Error;
use user::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The permission table has no entry for an enumerated role.
    #[error("Permission table has no entry for role: {0}")]
    MissingRoleEntry(Role),
}

/// A specialized Result type for authorization setup.
pub type Result<T> = std::result::Result<T, AuthzError>;
