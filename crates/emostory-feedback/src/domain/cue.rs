//! What the narrator says about the child's expression on its own.

use emostory_core::emotion::Emotion;
use serde::Serialize;

use super::policy::FeedbackCategory;

/// A short remark about the observed expression and how it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmotionCue {
    /// The remark.
    pub message: &'static str,
    /// How the expression reads, independent of the choice.
    pub tone: FeedbackCategory,
}

/// The cue for `emotion`; `None` means no expression was captured.
#[must_use]
pub fn emotion_cue(emotion: Option<Emotion>) -> EmotionCue {
    let (message, tone) = match emotion {
        Some(Emotion::Happy) => ("I see a smile! Great job!", FeedbackCategory::Positive),
        Some(Emotion::Excited) => ("You look excited! Wonderful!", FeedbackCategory::Positive),
        Some(Emotion::Sad) => (
            "You look sad. That's okay, feelings are important.",
            FeedbackCategory::Neutral,
        ),
        Some(Emotion::Frustrated) => (
            "I can see you're feeling frustrated. Take a deep breath.",
            FeedbackCategory::Negative,
        ),
        Some(Emotion::Neutral) => (
            "You're thinking carefully. How are you feeling?",
            FeedbackCategory::Neutral,
        ),
        None => ("I'm watching for your expression!", FeedbackCategory::Neutral),
    };
    EmotionCue { message, tone }
}
