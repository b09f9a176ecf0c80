//! Headless search host for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin,
//! runs them against the publication registry, and writes one
//! `ResponseEnvelope` line per command to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.
//!
//! Usage: `npa-host [config.toml]`. Without an argument the path comes from
//! `NPA_CONFIG`, then the platform config directory.

use std::path::PathBuf;

use npa::NpaConfig;
use npa::host::handler::CommandHandler;
use npa::host::stdio::run_stdio_bridge;
use npa::pravo::PravoStore;
use npa_search::NpaSearcher;

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("NPA_CONFIG"))
        .map(PathBuf::from)
        .unwrap_or_else(NpaConfig::default_config_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let config = NpaConfig::load_or_default(&path)
        .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?;
    config.validate()?;

    // Stdout is reserved for the JSON protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .init();

    tracing::info!(config = %path.display(), base_url = %config.api.base_url, "npa-host starting");

    let store = PravoStore::new(&config.api, &config.search)?;
    let searcher = NpaSearcher::new(store, config.search.clone())?;

    run_stdio_bridge(CommandHandler::new(searcher))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "npa-host exited with error");
            anyhow::anyhow!("npa-host failed: {e}")
        })?;

    tracing::info!("npa-host shut down cleanly");
    Ok(())
}
