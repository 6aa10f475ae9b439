//! eater-tail entry point.

mod app;
mod config;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting eater-tail");

    let config = config::Config::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    tracing::info!(listen = %config.listen, format = ?config.format, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("eater-tail shut down cleanly");
    Ok(())
}
