use anyhow::Result;
use api::ApiConfig;
use trellis_server::{init_logging, run, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(settings.log_dir.as_deref())?;

    run(ApiConfig::from_env()).await
}
