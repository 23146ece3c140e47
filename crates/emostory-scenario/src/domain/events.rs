//! Session events for the Scenario Playback context.

use emostory_core::emotion::EmotionSample;
use emostory_core::event::{EventMetadata, SessionEventEnvelope};
use emostory_feedback::FeedbackCategory;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::playthrough::Phase;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionExit {
    /// The child asked for another scenario.
    PlayAnother,
    /// The child went back to the profile screen.
    Home,
    /// The session was torn down without an explicit exit.
    Abandoned,
}

impl SessionExit {
    /// Lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SessionExit::PlayAnother => "play_another",
            SessionExit::Home => "home",
            SessionExit::Abandoned => "abandoned",
        }
    }
}

/// Event payload variants for a playthrough session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The session was created for a scenario.
    SessionStarted {
        scenario_id: String,
        profile_id: Option<Uuid>,
    },
    /// The intro narration was issued.
    IntroNarrated,
    /// The playthrough entered a phase.
    PhaseEntered { phase: Phase },
    /// Affect capture started.
    AffectArmed,
    /// Affect capture stopped.
    AffectDisarmed,
    /// Affect capture could not be used; the session continues without it.
    AffectUnavailable { reason: String },
    /// The "what would you do?" prompt was spoken.
    PromptIssued { retry: bool },
    /// A choice was accepted.
    ChoiceSelected { choice_id: String },
    /// The confirmation delay elapsed and the expression was captured.
    ChoiceConfirmed {
        choice_id: String,
        emotion: Option<EmotionSample>,
    },
    /// Feedback was produced and spoken.
    FeedbackGiven { category: FeedbackCategory },
    /// The outcome narration was spoken.
    OutcomeNarrated { choice_is_good: bool },
    /// The profile's completion count was incremented.
    ProgressCredited {
        profile_id: Uuid,
        scenarios_completed: u32,
    },
    /// The profile store could not be updated.
    ProgressCreditFailed { profile_id: Uuid, reason: String },
    /// The session ended.
    SessionExited { exit: SessionExit },
}

/// Event envelope for a playthrough session.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl SessionEventKind {
    /// The dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEventKind::SessionStarted { .. } => "scenario.session_started",
            SessionEventKind::IntroNarrated => "scenario.intro_narrated",
            SessionEventKind::PhaseEntered { .. } => "scenario.phase_entered",
            SessionEventKind::AffectArmed => "scenario.affect_armed",
            SessionEventKind::AffectDisarmed => "scenario.affect_disarmed",
            SessionEventKind::AffectUnavailable { .. } => "scenario.affect_unavailable",
            SessionEventKind::PromptIssued { .. } => "scenario.prompt_issued",
            SessionEventKind::ChoiceSelected { .. } => "scenario.choice_selected",
            SessionEventKind::ChoiceConfirmed { .. } => "scenario.choice_confirmed",
            SessionEventKind::FeedbackGiven { .. } => "scenario.feedback_given",
            SessionEventKind::OutcomeNarrated { .. } => "scenario.outcome_narrated",
            SessionEventKind::ProgressCredited { .. } => "scenario.progress_credited",
            SessionEventKind::ProgressCreditFailed { .. } => "scenario.progress_credit_failed",
            SessionEventKind::SessionExited { .. } => "scenario.session_exited",
        }
    }
}

impl SessionEventEnvelope for SessionEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or_default()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
