//! EmoStory command-line entry point.

use std::error::Error;

use emostory_cli::config::AppConfig;
use emostory_cli::runner;
use emostory_cli::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting EmoStory playthrough");

    // Read configuration from environment.
    let config = AppConfig::from_env()?;
    tracing::info!(
        scenario_id = %config.scenario_id,
        speech_enabled = config.settings.speech_enabled,
        affect_capture_enabled = config.settings.affect_capture_enabled,
        "configuration loaded"
    );

    let state = AppState::from_config(&config)?;
    let report = runner::run_playthrough(&state, &config).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
