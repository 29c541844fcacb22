use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub mod error;
pub mod storage;

pub use error::{DatabaseError, Result};
pub use storage::{
    ApiKey, ApiKeyStorage, IssuedApiKey, NewProject, Project, ProjectStorage, ProjectUpdate,
};

/// In-memory store for projects and API keys.
///
/// Each collection sits behind its own lock; readers never block each other.
#[derive(Debug, Default)]
pub struct Database {
    projects: RwLock<BTreeMap<String, Project>>,
    api_keys: RwLock<BTreeMap<String, ApiKey>>,
}

impl Database {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Initializing in-memory project store");
        Self::default()
    }

    /// Project operations
    pub fn projects(&self) -> ProjectStorage<'_> {
        ProjectStorage::new(&self.projects)
    }

    /// API key operations
    pub fn api_keys(&self) -> ApiKeyStorage<'_> {
        ApiKeyStorage::new(&self.api_keys)
    }

    /// Remove every project and API key owned by `owner_id`.
    ///
    /// Returns how many projects and keys were dropped.
    pub async fn remove_owned_by(&self, owner_id: &str) -> (usize, usize) {
        let projects = {
            let mut projects = self.projects.write().await;
            let before = projects.len();
            projects.retain(|_, p| p.owner_id != owner_id);
            before - projects.len()
        };

        let keys = {
            let mut keys = self.api_keys.write().await;
            let before = keys.len();
            keys.retain(|_, k| k.owner_id != owner_id);
            before - keys.len()
        };

        debug!(
            "Removed {} projects and {} API keys owned by {}",
            projects, keys, owner_id
        );
        (projects, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_owned_by() {
        let db = Database::new();
        db.projects()
            .create(NewProject::new("Alpha", "", "usr_alice"))
            .await
            .unwrap();
        db.projects()
            .create(NewProject::new("Beta", "", "usr_bob"))
            .await
            .unwrap();
        db.api_keys().create("ci", "usr_alice").await.unwrap();

        assert_eq!(db.remove_owned_by("usr_alice").await, (1, 1));
        assert_eq!(db.projects().count().await, 1);
        assert_eq!(db.api_keys().count().await, 0);
        assert_eq!(db.remove_owned_by("usr_alice").await, (0, 0));
    }
}
