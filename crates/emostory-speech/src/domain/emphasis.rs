//! Per-call speech options and emphasis presets.

use emostory_core::speech::{UtterancePriority, Voice};
use serde::{Deserialize, Serialize};

/// Narration rate used when neither the call nor the settings specify one.
pub const DEFAULT_RATE: f32 = 0.9;
/// Slightly raised pitch for a child-friendly sound.
pub const DEFAULT_PITCH: f32 = 1.1;
/// Full volume.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Tone presets for `speak_with_emphasis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    /// Faster and higher, for celebrations.
    Excited,
    /// Slower and lower, for settling down.
    Calm,
    /// Gently lifted, the default narrator tone.
    #[default]
    Encouraging,
}

impl Emphasis {
    /// `(rate, pitch)` for this preset.
    #[must_use]
    pub fn profile(self) -> (f32, f32) {
        match self {
            Emphasis::Excited => (1.1, 1.3),
            Emphasis::Calm => (0.8, 0.9),
            Emphasis::Encouraging => (0.95, 1.15),
        }
    }

    /// Speak options carrying this preset.
    #[must_use]
    pub fn options(self) -> SpeakOptions {
        let (rate, pitch) = self.profile();
        SpeakOptions {
            rate: Some(rate),
            pitch: Some(pitch),
            ..SpeakOptions::default()
        }
    }
}

/// Optional overrides for a single `speak` call. Unset fields fall back to
/// the accessibility settings and then to the crate defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeakOptions {
    /// Rate override.
    pub rate: Option<f32>,
    /// Pitch override.
    pub pitch: Option<f32>,
    /// Volume override, clamped to `[0, 1]`.
    pub volume: Option<f32>,
    /// Priority hint for the backend.
    pub priority: UtterancePriority,
    /// Explicit voice; otherwise a child-friendly voice is picked.
    pub voice: Option<Voice>,
}

impl SpeakOptions {
    /// Same options with `priority` set.
    #[must_use]
    pub fn with_priority(mut self, priority: UtterancePriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_presets() {
        assert_eq!(Emphasis::Excited.profile(), (1.1, 1.3));
        assert_eq!(Emphasis::Calm.profile(), (0.8, 0.9));
        assert_eq!(Emphasis::Encouraging.profile(), (0.95, 1.15));
    }

    #[test]
    fn test_emphasis_options_leave_volume_unset() {
        let options = Emphasis::Calm.options();
        assert_eq!(options.rate, Some(0.8));
        assert_eq!(options.pitch, Some(0.9));
        assert_eq!(options.volume, None);
        assert_eq!(options.priority, UtterancePriority::Normal);
    }
}
