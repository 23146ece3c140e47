//! Emotion vocabulary shared by the affect source and feedback policy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An expression the affect source can report.
///
/// "No reading" is modelled as `Option<Emotion>::None` rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Smiling.
    Happy,
    /// Downcast.
    Sad,
    /// No strong expression.
    Neutral,
    /// Visibly frustrated.
    Frustrated,
    /// Visibly excited.
    Excited,
}

impl Emotion {
    /// Every emotion, in the order the simulated device draws from.
    pub const ALL: [Emotion; 5] = [
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Frustrated,
        Emotion::Excited,
    ];

    /// Lowercase label used in logs and journals.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Neutral => "neutral",
            Emotion::Frustrated => "frustrated",
            Emotion::Excited => "excited",
        }
    }

    /// Whether this is a visibly positive expression (happy or excited).
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(self, Emotion::Happy | Emotion::Excited)
    }

    /// Whether this is a visibly negative expression (sad or frustrated).
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(self, Emotion::Sad | Emotion::Frustrated)
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single reading from the affect source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEmotionSample")]
pub struct EmotionSample {
    /// The detected expression.
    pub emotion: Emotion,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

#[derive(Deserialize)]
struct RawEmotionSample {
    emotion: Emotion,
    confidence: f32,
}

impl From<RawEmotionSample> for EmotionSample {
    fn from(raw: RawEmotionSample) -> Self {
        Self::new(raw.emotion, raw.confidence)
    }
}

impl EmotionSample {
    /// Creates a sample, clamping confidence into `[0, 1]`.
    #[must_use]
    pub fn new(emotion: Emotion, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            emotion,
            confidence,
        }
    }
}
