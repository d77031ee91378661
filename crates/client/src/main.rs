//! Encounter controller binary.
//!
//! Runs a dry run of the encounter against the in-memory sandbox arena and
//! prints the final summary as JSON.
//!
//! ```bash
//! ENCOUNTER_STYLES=melee,magic ENCOUNTER_SEED=7 cargo run -p encounter-client
//! ```

use anyhow::{Context, Result};
use encounter_client::{ClientConfig, dry_run, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env().context("failed to load configuration")?;
    let _guard = logging::setup_logging(&config)?;

    tracing::info!(
        opponent = %config.encounter.opponent_name,
        styles = ?config.encounter.enabled_styles,
        seed = ?config.encounter.rng_seed,
        "Starting encounter dry run"
    );

    let summary = dry_run::run(config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
