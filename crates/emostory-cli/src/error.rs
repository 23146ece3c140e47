//! EmoStory: host error types.

use emostory_core::error::EngineError;
use emostory_scenario::CatalogError;
use thiserror::Error;

/// Startup and runtime errors for the command-line host.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Scenario content could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The playback engine rejected an operation.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The playthrough did not reach the expected phase in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// Output could not be written.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}
