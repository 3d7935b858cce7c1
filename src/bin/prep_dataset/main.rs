//! Dataset prep orchestrator - merges dated CSP datafiles into one dataset

use anyhow::{Context, Result};
use csp_dataset::ingestion::PrepConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("Starting dataset prep");

    // Load configuration from environment
    dotenvy::dotenv().ok();
    let config = PrepConfig::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: {} URNs, {} national groupings, {} columns",
        config.keep_urns.len(),
        config.keep_national.len(),
        config.keep_columns.len()
    );

    let stats = csp_dataset::run(&config)?;

    for file in &stats.files {
        info!("✓ {}", file);
    }
    info!("✓ Dataset written to {:?}: {}", config.output_path, stats);

    Ok(())
}
