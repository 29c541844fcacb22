//! In-memory user directory.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use crate::auth::{Identity, IdentityDirectory, IdentityUpdate, NewIdentity};
use crate::error::{Result, UserError};

/// Prefix of generated identity ids.
pub const USER_ID_PREFIX: &str = "usr_";

/// User storage backed by an ordered map keyed by identity id.
///
/// Emails are unique, compared case-insensitively.
#[derive(Debug, Default)]
pub struct UserDatabase {
    users: RwLock<BTreeMap<String, Identity>>,
}

impl UserDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<Identity> {
        self.users.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<Identity> {
        self.users.read().await.get(id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Identity> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Registers a new identity under a freshly generated id.
    pub async fn create(&self, new: NewIdentity) -> Result<Identity> {
        let id = format!("{}{}", USER_ID_PREFIX, Ulid::new());
        self.insert(Identity::new(id, new.email, new.name, new.role))
            .await
    }

    /// Stores an identity with a caller-chosen id.
    pub async fn insert(&self, identity: Identity) -> Result<Identity> {
        let mut users = self.users.write().await;

        if users.contains_key(&identity.id) {
            return Err(UserError::DuplicateId(identity.id));
        }
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&identity.email))
        {
            return Err(UserError::DuplicateEmail(identity.email));
        }

        users.insert(identity.id.clone(), identity.clone());
        info!("Created user {} ({})", identity.id, identity.role);
        Ok(identity)
    }

    pub async fn update(&self, id: &str, update: IdentityUpdate) -> Result<Identity> {
        let mut users = self.users.write().await;

        if let Some(email) = &update.email {
            let taken = users
                .values()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let identity = users
            .get_mut(id)
            .ok_or_else(|| UserError::UserNotFound(id.to_string()))?;

        if let Some(email) = update.email {
            identity.email = email;
        }
        if let Some(name) = update.name {
            identity.name = name;
        }
        if let Some(role) = update.role {
            identity.role = role;
        }
        identity.updated_at = Utc::now();

        debug!("Updated user {}", id);
        Ok(identity.clone())
    }

    pub async fn delete(&self, id: &str) -> Result<Identity> {
        let removed = self
            .users
            .write()
            .await
            .remove(id)
            .ok_or_else(|| UserError::UserNotFound(id.to_string()))?;

        info!("Deleted user {}", id);
        Ok(removed)
    }
}

#[async_trait]
impl IdentityDirectory for UserDatabase {
    async fn lookup_by_id(&self, id: &str) -> Option<Identity> {
        self.get(id).await
    }

    async fn lookup_by_email(&self, email: &str) -> Option<Identity> {
        self.find_by_email(email).await
    }
}
