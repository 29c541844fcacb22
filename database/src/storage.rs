use crate::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

pub const PROJECT_ID_PREFIX: &str = "prj_";
pub const API_KEY_ID_PREFIX: &str = "key_";
pub const API_KEY_SECRET_PREFIX: &str = "tk_";

const API_KEY_SECRET_LEN: usize = 32;
const API_KEY_DISPLAY_LEN: usize = 8;

/// A project owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub owner_id: String,
}

impl NewProject {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            owner_id: owner_id.into(),
        }
    }
}

/// Partial project update; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Project storage operations
pub struct ProjectStorage<'a> {
    projects: &'a RwLock<BTreeMap<String, Project>>,
}

impl<'a> ProjectStorage<'a> {
    pub(crate) fn new(projects: &'a RwLock<BTreeMap<String, Project>>) -> Self {
        Self { projects }
    }

    /// Create a new project under a generated id
    pub async fn create(&self, new: NewProject) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: format!("{}{}", PROJECT_ID_PREFIX, Ulid::new()),
            name: new.name,
            description: new.description,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        };
        self.insert(project).await
    }

    /// Store a project with a caller-chosen id
    pub async fn insert(&self, project: Project) -> Result<Project> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(DatabaseError::Validation(format!(
                "project id already in use: {}",
                project.id
            )));
        }
        projects.insert(project.id.clone(), project.clone());

        info!("Created project {} owned by {}", project.id, project.owner_id);
        Ok(project)
    }

    pub async fn get(&self, id: &str) -> Result<Project> {
        self.projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DatabaseError::ProjectNotFound(id.to_string()))
    }

    /// All projects, ordered by id (ULIDs sort by creation time)
    pub async fn list(&self) -> Vec<Project> {
        self.projects.read().await.values().cloned().collect()
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<Project> {
        self.projects
            .read()
            .await
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub async fn update(&self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| DatabaseError::ProjectNotFound(id.to_string()))?;

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        project.updated_at = Utc::now();

        debug!("Updated project {}", id);
        Ok(project.clone())
    }

    pub async fn delete(&self, id: &str) -> Result<Project> {
        let removed = self
            .projects
            .write()
            .await
            .remove(id)
            .ok_or_else(|| DatabaseError::ProjectNotFound(id.to_string()))?;

        info!("Deleted project {}", id);
        Ok(removed)
    }

    pub async fn count(&self) -> usize {
        self.projects.read().await.len()
    }
}

/// Stored API key metadata. The secret itself is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    /// First characters of the secret, for display
    pub prefix: String,
    pub created_at: DateTime<Utc>,
}

/// A freshly created key together with its one-time secret
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    #[serde(flatten)]
    pub key: ApiKey,
    pub secret: String,
}

/// API key storage operations
pub struct ApiKeyStorage<'a> {
    keys: &'a RwLock<BTreeMap<String, ApiKey>>,
}

impl<'a> ApiKeyStorage<'a> {
    pub(crate) fn new(keys: &'a RwLock<BTreeMap<String, ApiKey>>) -> Self {
        Self { keys }
    }

    /// Issue a new key for `owner_id`
    pub async fn create(&self, name: &str, owner_id: &str) -> Result<IssuedApiKey> {
        let secret = generate_secret();
        let key = ApiKey {
            id: format!("{}{}", API_KEY_ID_PREFIX, Ulid::new()),
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            prefix: secret
                .chars()
                .take(API_KEY_SECRET_PREFIX.len() + API_KEY_DISPLAY_LEN)
                .collect(),
            created_at: Utc::now(),
        };

        self.keys.write().await.insert(key.id.clone(), key.clone());
        info!("Issued API key {} for {}", key.id, owner_id);

        Ok(IssuedApiKey { key, secret })
    }

    pub async fn get(&self, id: &str) -> Result<ApiKey> {
        self.keys
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DatabaseError::ApiKeyNotFound(id.to_string()))
    }

    pub async fn list(&self) -> Vec<ApiKey> {
        self.keys.read().await.values().cloned().collect()
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<ApiKey> {
        self.keys
            .read()
            .await
            .values()
            .filter(|k| k.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub async fn delete(&self, id: &str) -> Result<ApiKey> {
        let removed = self
            .keys
            .write()
            .await
            .remove(id)
            .ok_or_else(|| DatabaseError::ApiKeyNotFound(id.to_string()))?;

        info!("Revoked API key {}", id);
        Ok(removed)
    }

    pub async fn count(&self) -> usize {
        self.keys.read().await.len()
    }
}

fn generate_secret() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_SECRET_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", API_KEY_SECRET_PREFIX, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_project_crud() {
        let db = Database::new();
        let projects = db.projects();

        let created = projects
            .create(NewProject::new("Apollo", "Moonshot", "usr_alice"))
            .await
            .unwrap();
        assert!(created.id.starts_with(PROJECT_ID_PREFIX));
        assert_eq!(projects.get(&created.id).await.unwrap(), created);

        let updated = projects
            .update(
                &created.id,
                ProjectUpdate {
                    name: Some("Artemis".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Artemis");
        assert_eq!(updated.description, "Moonshot");
        assert_eq!(updated.owner_id, "usr_alice");

        projects.delete(&created.id).await.unwrap();
        assert_eq!(
            projects.get(&created.id).await.unwrap_err(),
            DatabaseError::ProjectNotFound(created.id.clone())
        );
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let db = Database::new();
        for (name, owner) in [("a", "usr_alice"), ("b", "usr_bob"), ("c", "usr_alice")] {
            db.projects()
                .create(NewProject::new(name, "", owner))
                .await
                .unwrap();
        }
        assert_eq!(db.projects().list().await.len(), 3);
        assert_eq!(db.projects().list_by_owner("usr_alice").await.len(), 2);
        assert!(db.projects().list_by_owner("usr_carol").await.is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let db = Database::new();
        let project = db
            .projects()
            .create(NewProject::new("a", "", "usr_alice"))
            .await
            .unwrap();
        assert!(matches!(
            db.projects().insert(project).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_api_key_secret_not_stored() {
        let db = Database::new();
        let issued = db.api_keys().create("deploy", "usr_bob").await.unwrap();

        assert!(issued.secret.starts_with(API_KEY_SECRET_PREFIX));
        assert_eq!(
            issued.secret.len(),
            API_KEY_SECRET_PREFIX.len() + API_KEY_SECRET_LEN
        );
        assert!(issued.secret.starts_with(&issued.key.prefix));

        let stored = db.api_keys().get(&issued.key.id).await.unwrap();
        assert_eq!(stored, issued.key);
        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("secret").is_none());
    }

    #[tokio::test]
    async fn test_api_key_delete() {
        let db = Database::new();
        let issued = db.api_keys().create("deploy", "usr_bob").await.unwrap();
        assert_eq!(db.api_keys().list_by_owner("usr_bob").await.len(), 1);

        db.api_keys().delete(&issued.key.id).await.unwrap();
        assert_eq!(
            db.api_keys().delete(&issued.key.id).await.unwrap_err(),
            DatabaseError::ApiKeyNotFound(issued.key.id.clone())
        );
    }
}
