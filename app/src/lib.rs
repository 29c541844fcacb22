mod logging;

use anyhow::{anyhow, Result};
use api::{ApiConfig, AppState};
use authz::AuthzEngine;
use database::Database;
use std::{path::PathBuf, sync::Arc};
use user::UserManager;

pub use logging::{init_logging, log_shutdown};

pub const LOG_DIR_ENV: &str = "TRELLIS_LOG_DIR";

/// Process-level settings read once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the environment, reading `.env` first if present
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_dir: lookup(LOG_DIR_ENV)
                .map(|dir| dir.trim().to_string())
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Wire up the stores and the authorization engine.
///
/// Fails if the permission table does not cover every role, so a broken
/// table stops the process before it serves a request.
pub fn build_state() -> Result<AppState> {
    let engine = AuthzEngine::builtin()?;
    tracing::info!(
        "Authorization engine ready ({} roles)",
        engine.permissions().roles().count()
    );

    Ok(AppState::new(
        Arc::new(UserManager::new()),
        Arc::new(Database::new()),
        Arc::new(engine),
    ))
}

/// Run the API server until shutdown
pub async fn run(config: ApiConfig) -> Result<()> {
    tracing::info!("=== Trellis starting ===");
    let state = build_state()?;

    api::start_server_with_config(state, config)
        .await
        .map_err(|e| anyhow!("API server error: {}", e))?;

    log_shutdown();
    Ok(())
}
