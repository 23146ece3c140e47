//! Child profile port.
//!
//! Persistence is owned by an external collaborator. The engine reads a
//! profile once per credited session and applies at most one patch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CollaboratorError;

/// Snapshot of a child profile as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Number of scenarios completed with a good choice.
    pub scenarios_completed: u32,
    /// Last time the profile was active.
    pub last_active: DateTime<Utc>,
}

/// Partial update applied to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressPatch {
    /// New value for `scenarios_completed`, if changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios_completed: Option<u32>,
}

impl ProgressPatch {
    /// Builds the patch that credits one completed scenario to `profile`.
    #[must_use]
    pub fn credit_completion(profile: &Profile) -> Self {
        Self {
            scenarios_completed: Some(profile.scenarios_completed.saturating_add(1)),
        }
    }

    /// Applies the patch to a profile in place.
    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(completed) = self.scenarios_completed {
            profile.scenarios_completed = completed;
        }
    }
}

/// Read/patch access to persisted profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a profile by id.
    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, CollaboratorError>;

    /// Apply a partial update to a profile.
    async fn apply_patch(
        &self,
        profile_id: Uuid,
        patch: ProgressPatch,
    ) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(completed: u32) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: "Alex".to_owned(),
            scenarios_completed: completed,
            last_active: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_credit_completion_increments_by_one() {
        // Arrange
        let mut p = profile(4);

        // Act
        let patch = ProgressPatch::credit_completion(&p);
        patch.apply_to(&mut p);

        // Assert
        assert_eq!(patch.scenarios_completed, Some(5));
        assert_eq!(p.scenarios_completed, 5);
    }

    #[test]
    fn test_credit_completion_saturates() {
        let p = profile(u32::MAX);
        assert_eq!(
            ProgressPatch::credit_completion(&p).scenarios_completed,
            Some(u32::MAX)
        );
    }

    #[test]
    fn test_empty_patch_leaves_profile_untouched() {
        let mut p = profile(2);
        ProgressPatch::default().apply_to(&mut p);
        assert_eq!(p.scenarios_completed, 2);
    }
}
