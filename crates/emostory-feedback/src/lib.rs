//! EmoStory: Affect Feedback.
//!
//! A pure policy: given whether the chosen option was a good one and the
//! expression captured when the choice was confirmed, produce the spoken
//! message, its category, a toast summary and the emotion cue shown on screen.

pub mod domain;

pub use domain::cue::{EmotionCue, emotion_cue};
pub use domain::policy::{Feedback, FeedbackCategory, FeedbackEngine, Toast, ToastLevel};
