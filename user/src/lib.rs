pub mod auth;
pub mod database;
pub mod error;

use std::sync::Arc;
use tracing::info;

use auth::AuthService;
use database::UserDatabase;

/// User directory plus the authentication service reading from it.
pub struct UserManager {
    database: Arc<UserDatabase>,
    auth_service: AuthService,
}

impl UserManager {
    /// Create a user manager over an empty in-memory directory
    pub fn new() -> Self {
        Self::with_database(Arc::new(UserDatabase::new()))
    }

    /// Create a user manager over an existing directory
    pub fn with_database(database: Arc<UserDatabase>) -> Self {
        let auth_service = AuthService::new(database.clone());
        info!("User management system initialized");

        Self {
            database,
            auth_service,
        }
    }

    /// Get a reference to the database
    pub fn database(&self) -> &UserDatabase {
        &self.database
    }

    /// Get a reference to the authentication service
    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
}

impl Default for UserManager {
    fn default() -> Self {
        Self::new()
    }
}

pub use error::{AuthError, Result as UserResult, TokenError, UserError};

pub use auth::{
    AuthContext, Identity, IdentityDirectory, IdentityUpdate, NewIdentity, ParsedToken, Role,
    RoleParseError, SessionToken,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_manager_shares_directory() {
        let manager = UserManager::new();
        manager
            .database()
            .insert(Identity::new(
                "usr_alice",
                "alice@example.com",
                "Alice",
                Role::Member,
            ))
            .await
            .unwrap();

        let (token, _) = manager
            .auth_service()
            .login("alice@example.com")
            .await
            .unwrap();
        let ctx = manager
            .auth_service()
            .resolve(token.as_str())
            .await
            .unwrap();
        assert_eq!(ctx.identity_id, "usr_alice");
    }
}
