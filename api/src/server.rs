use crate::{create_router, seed, AppState};
use std::{env, str::FromStr};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const HOST_ENV: &str = "TRELLIS_HOST";
pub const PORT_ENV: &str = "TRELLIS_PORT";
pub const SEED_DATA_ENV: &str = "TRELLIS_SEED_DATA";

/// API server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Whether to load the demo users and projects on startup
    pub seed_data: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            #[cfg(debug_assertions)]
            seed_data: true,
            #[cfg(not(debug_assertions))]
            seed_data: false,
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TRELLIS_HOST`, `TRELLIS_PORT` and
    /// `TRELLIS_SEED_DATA`. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = parse_var(&lookup, PORT_ENV) {
            config.port = port;
        }
        if let Some(seed) = parse_var(&lookup, SEED_DATA_ENV) {
            config.seed_data = seed;
        }
        config
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set whether to load demo data
    pub fn with_seed_data(mut self, seed: bool) -> Self {
        self.seed_data = seed;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

/// Start the API server with the given configuration
///
/// Runs until ctrl-c.
pub async fn start_server_with_config(
    state: AppState,
    config: ApiConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if config.seed_data {
        info!("Loading demo data");
        if let Err(e) = seed::seed_demo_data(&state).await {
            warn!("Failed to load demo data: {}", e);
        }
    }

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);
    info!(
        "Swagger UI available at http://localhost:{}/api/v1/swagger",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

/// Start the API server with configuration read from the environment
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    start_server_with_config(state, ApiConfig::from_env()).await
}

/// Start the API server in a background task
pub fn spawn_server(state: AppState, config: ApiConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = start_server_with_config(state, config).await {
            tracing::error!("API server error: {}", e);
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
