//! Demo data for development servers and tests.

use database::NewProject;
use tracing::info;
use user::{Identity, Role};

use crate::{error::ApiResult, AppState};

/// Seed users as `(id, email, name, role)`
pub const DEMO_USERS: [(&str, &str, &str, Role); 4] = [
    ("usr_admin", "admin@example.com", "Ada Admin", Role::Admin),
    ("usr_alice", "alice@example.com", "Alice Member", Role::Member),
    ("usr_bob", "bob@example.com", "Bob Member", Role::Member),
    ("usr_viewer", "viewer@example.com", "Vera Viewer", Role::Viewer),
];

/// Load the demo users and one project each for alice and bob.
///
/// Does nothing if the user directory already has entries.
pub async fn seed_demo_data(state: &AppState) -> ApiResult<()> {
    let directory = state.users.database();
    if directory.count().await > 0 {
        info!("User directory not empty, skipping demo data");
        return Ok(());
    }

    for (id, email, name, role) in DEMO_USERS {
        directory
            .insert(Identity::new(id, email, name, role))
            .await?;
    }

    let projects = state.db.projects();
    projects
        .create(NewProject::new(
            "Apollo",
            "Alice's launch checklist",
            "usr_alice",
        ))
        .await?;
    projects
        .create(NewProject::new("Borealis", "Bob's research notes", "usr_bob"))
        .await?;

    info!(
        "Seeded {} demo users and {} projects",
        directory.count().await,
        projects.count().await
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let state = AppState::with_builtin_authz().unwrap();
        seed_demo_data(&state).await.unwrap();
        seed_demo_data(&state).await.unwrap();

        assert_eq!(state.users.database().count().await, 4);
        assert_eq!(state.db.projects().count().await, 2);
        let admin = state
            .users
            .database()
            .find_by_email("ADMIN@example.com")
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
