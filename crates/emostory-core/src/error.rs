//! Error taxonomy.
//!
//! Collaborators report `CollaboratorError`. The scenario engine catches every
//! collaborator error at its boundary and downgrades it to an `EngineError`,
//! so no raw collaborator failure reaches the presentation layer.

use thiserror::Error;

/// Errors surfaced by the scenario playback engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No scenario record exists for the requested id. Fatal to the session.
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    /// The selected choice id is not part of the scenario.
    #[error("invalid choice {choice_id} for scenario {scenario_id}")]
    InvalidChoice {
        /// The scenario being played.
        scenario_id: String,
        /// The rejected choice id.
        choice_id: String,
    },

    /// The operation is not accepted in the current phase.
    #[error("cannot {action} while in {phase} phase")]
    InvalidTransition {
        /// The phase the session was in.
        phase: &'static str,
        /// The rejected operation.
        action: &'static str,
    },

    /// The session has already exited; no further operations are accepted.
    #[error("session has ended")]
    SessionEnded,

    /// Speech output is unavailable; treated as silence.
    #[error("speech unavailable: {0}")]
    SpeechUnavailable(String),

    /// The affect source could not be used; the engine proceeds without emotion data.
    #[error("affect source unavailable: {0}")]
    AffectSourceUnavailable(String),
}

impl EngineError {
    /// Whether the session can continue after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::ScenarioNotFound(_))
    }
}

/// Errors reported by external collaborators (profile store, devices, content).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The capability is not supported on this host.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
