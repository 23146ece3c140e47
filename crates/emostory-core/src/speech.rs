//! Speech output port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Relative importance of an utterance, passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtterancePriority {
    /// Ordinary narration.
    #[default]
    Normal,
    /// Feedback and outcome lines the child should not miss.
    High,
}

/// A voice offered by the speech backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Backend-specific voice name.
    pub name: String,
    /// BCP 47 language tag, e.g. `en-US`.
    pub lang: String,
}

/// A fully resolved request to speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    /// Text to speak.
    pub text: String,
    /// Rate multiplier.
    pub rate: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Volume in `[0, 1]`.
    pub volume: f32,
    /// Priority hint.
    pub priority: UtterancePriority,
    /// Voice to use, or the backend default.
    pub voice: Option<Voice>,
}

/// A text-to-speech engine.
///
/// `utter` resolves when the utterance ends naturally. The orchestrator
/// cancels by dropping the future and calling `cancel`.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Whether the host can speak at all.
    fn is_supported(&self) -> bool;

    /// Installed voices.
    fn voices(&self) -> Vec<Voice>;

    /// Speak `utterance` to completion.
    async fn utter(&self, utterance: Utterance) -> Result<(), CollaboratorError>;

    /// Silence whatever is being spoken.
    fn cancel(&self);

    /// Suspend the current utterance.
    fn pause(&self);

    /// Continue a suspended utterance.
    fn resume(&self);
}
