//! Authentication module for Trellis
//!
//! This module provides:
//! - The identity/role data model
//! - The session token codec
//! - The `IdentityDirectory` seam used to look identities up
//! - `AuthService`, which logs users in and resolves bearer tokens

pub mod token;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use token::{ParsedToken, SessionToken};
pub use types::{AuthContext, Identity, IdentityUpdate, NewIdentity, Role, RoleParseError};

use crate::error::AuthError;

/// Read-only view of the user directory.
///
/// Lookups are point reads; implementations must not require callers to
/// hold any lock.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn lookup_by_id(&self, id: &str) -> Option<Identity>;

    async fn lookup_by_email(&self, email: &str) -> Option<Identity>;
}

/// Login and token resolution on top of an identity directory.
///
/// Built once at startup and shared; holds no per-session state.
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn IdentityDirectory>,
}

impl AuthService {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }

    /// Mints a new session token for the identity registered under `email`.
    ///
    /// Demo-grade: there is no password, knowing the email is enough.
    pub async fn login(&self, email: &str) -> Result<(SessionToken, Identity), AuthError> {
        let Some(identity) = self.directory.lookup_by_email(email.trim()).await else {
            warn!("Login rejected: no identity for the supplied email");
            return Err(AuthError::InvalidCredentials);
        };

        let token = token::mint(&identity.id);
        info!("Issued session token for user: {}", identity.id);

        Ok((token, identity))
    }

    /// Decodes `token` and loads the identity it was minted for.
    pub async fn resolve(&self, token: &str) -> Result<AuthContext, AuthError> {
        let parsed = token::parse(token)?;

        let identity = self
            .directory
            .lookup_by_id(&parsed.identity_id)
            .await
            .ok_or_else(|| AuthError::UserNotFound(parsed.identity_id.clone()))?;

        debug!(
            "Resolved session {} for user {}",
            parsed.session_id, parsed.identity_id
        );

        Ok(AuthContext {
            identity_id: parsed.identity_id,
            identity,
            session_id: parsed.session_id,
        })
    }
}
