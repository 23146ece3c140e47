//! Accessibility settings port.
//!
//! Settings can change mid-session, so consumers read a fresh snapshot on
//! every use instead of caching one.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Read-only snapshot of the accessibility preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessibilitySettings {
    /// Whether narration is spoken at all.
    pub speech_enabled: bool,
    /// Narration rate multiplier; `0` or below means "use the default rate".
    pub narration_speed: f32,
    /// Whether scene descriptions are narrated in addition to the story.
    pub enhanced_narration_enabled: bool,
    /// Whether the affect source may be armed.
    pub affect_capture_enabled: bool,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            speech_enabled: true,
            narration_speed: 1.0,
            enhanced_narration_enabled: false,
            affect_capture_enabled: true,
        }
    }
}

/// Source of accessibility snapshots.
pub trait AccessibilitySettingsSource: Send + Sync {
    /// Returns the settings as of now.
    fn snapshot(&self) -> AccessibilitySettings;
}

/// Settings held in memory and updatable from the host UI.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<AccessibilitySettings>>,
}

impl SharedSettings {
    /// Creates a handle seeded with `settings`.
    #[must_use]
    pub fn new(settings: AccessibilitySettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replaces the current settings. Visible to the next `snapshot()`.
    pub fn update(&self, f: impl FnOnce(&mut AccessibilitySettings)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl AccessibilitySettingsSource for SharedSettings {
    fn snapshot(&self) -> AccessibilitySettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_is_visible_to_next_snapshot() {
        // Arrange
        let settings = SharedSettings::new(AccessibilitySettings::default());
        let reader = settings.clone();

        // Act
        settings.update(|s| {
            s.speech_enabled = false;
            s.narration_speed = 0.75;
        });

        // Assert
        let snapshot = reader.snapshot();
        assert!(!snapshot.speech_enabled);
        assert!((snapshot.narration_speed - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_defaults_enable_speech_and_affect() {
        let defaults = AccessibilitySettings::default();
        assert!(defaults.speech_enabled);
        assert!(defaults.affect_capture_enabled);
        assert!(!defaults.enhanced_narration_enabled);
    }
}
