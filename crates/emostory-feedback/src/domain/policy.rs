//! The feedback policy table.
//!
//! | good choice | expression      | category | message                                   |
//! |-------------|-----------------|----------|-------------------------------------------|
//! | yes         | happy / excited | positive | affirms choice and the visible expression |
//! | yes         | other / none    | positive | affirms choice, invites showing a feeling |
//! | no          | sad / frustrated| negative | acknowledges feeling, invites rethinking  |
//! | no          | other / none    | neutral  | gently questions the choice               |

use emostory_core::emotion::Emotion;
use serde::{Deserialize, Serialize};

use super::cue::{EmotionCue, emotion_cue};

/// Overall tone of a feedback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    /// Affirming.
    Positive,
    /// Gently questioning.
    Neutral,
    /// Acknowledges a negative expression.
    Negative,
}

impl FeedbackCategory {
    /// Lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FeedbackCategory::Positive => "positive",
            FeedbackCategory::Neutral => "neutral",
            FeedbackCategory::Negative => "negative",
        }
    }
}

/// Visual weight of the toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    /// Celebratory styling.
    Success,
    /// Plain styling.
    Info,
}

/// One-line summary shown as a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Styling.
    pub level: ToastLevel,
    /// Summary text.
    pub text: &'static str,
}

/// Feedback for one confirmed choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    /// Spoken and displayed message.
    pub message: String,
    /// Overall tone.
    pub category: FeedbackCategory,
    /// Toast summary.
    pub toast: Toast,
    /// The remark about the expression alone.
    pub cue: EmotionCue,
}

/// Stateless feedback policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackEngine;

impl FeedbackEngine {
    /// Evaluates a confirmed choice against the expression captured with it.
    #[must_use]
    pub fn evaluate(choice_is_good: bool, emotion: Option<Emotion>) -> Feedback {
        let cue = emotion_cue(emotion);
        let positive_affect = emotion.is_some_and(Emotion::is_positive);
        let negative_affect = emotion.is_some_and(Emotion::is_negative);

        let (category, message, toast) = match (choice_is_good, positive_affect, negative_affect) {
            (true, true, _) => (
                FeedbackCategory::Positive,
                format!(
                    "{} That was a wonderful choice! You're being very kind!",
                    cue.message
                ),
                Toast {
                    level: ToastLevel::Success,
                    text: "Great job! Excellent choice and expression!",
                },
            ),
            (true, false, _) => (
                FeedbackCategory::Positive,
                format!("That was a good choice! {}", cue.message),
                Toast {
                    level: ToastLevel::Success,
                    text: "Good choice! Try showing how you feel with your face!",
                },
            ),
            (false, _, true) => (
                FeedbackCategory::Negative,
                format!(
                    "{} That choice might hurt someone's feelings. What else could we do?",
                    cue.message
                ),
                RECONSIDER_TOAST,
            ),
            (false, _, false) => (
                FeedbackCategory::Neutral,
                format!("Hmm, that choice might not be the kindest. {}", cue.message),
                RECONSIDER_TOAST,
            ),
        };

        Feedback {
            message,
            category,
            toast,
            cue,
        }
    }
}

const RECONSIDER_TOAST: Toast = Toast {
    level: ToastLevel::Info,
    text: "Think about how others might feel",
};
