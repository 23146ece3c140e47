//! Test profile stores: mock `ProfileStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use emostory_core::error::CollaboratorError;
use emostory_core::profile::{Profile, ProfileStore, ProgressPatch};
use uuid::Uuid;

use crate::clock::fixed_now;

/// Builds a profile with the given completion count and a fixed timestamp.
#[must_use]
pub fn sample_profile(scenarios_completed: u32) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        name: "Alex".to_owned(),
        scenarios_completed,
        last_active: fixed_now(),
    }
}

/// A profile store that keeps profiles in memory and records every
/// `apply_patch` call.
#[derive(Debug, Default)]
pub struct RecordingProfileStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    patches: Mutex<Vec<(Uuid, ProgressPatch)>>,
}

impl RecordingProfileStore {
    /// Create a store holding a single profile.
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        let store = Self::default();
        store.profiles.lock().unwrap().insert(profile.id, profile);
        store
    }

    /// Returns a snapshot of all patches that were applied.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn applied_patches(&self) -> Vec<(Uuid, ProgressPatch)> {
        self.patches.lock().unwrap().clone()
    }

    /// Returns the stored profile, if present.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn profile(&self, profile_id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&profile_id).cloned()
    }
}

#[async_trait]
impl ProfileStore for RecordingProfileStore {
    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, CollaboratorError> {
        self.profile(profile_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("profile {profile_id}")))
    }

    async fn apply_patch(
        &self,
        profile_id: Uuid,
        patch: ProgressPatch,
    ) -> Result<(), CollaboratorError> {
        self.patches.lock().unwrap().push((profile_id, patch));
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(&profile_id) {
            patch.apply_to(profile);
        }
        Ok(())
    }
}

/// A profile store that always returns an infrastructure error. Useful for
/// testing that collaborator failures never escape the engine.
#[derive(Debug)]
pub struct FailingProfileStore;

#[async_trait]
impl ProfileStore for FailingProfileStore {
    async fn get_profile(&self, _profile_id: Uuid) -> Result<Profile, CollaboratorError> {
        Err(CollaboratorError::Infrastructure("storage unavailable".into()))
    }

    async fn apply_patch(
        &self,
        _profile_id: Uuid,
        _patch: ProgressPatch,
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Infrastructure("storage unavailable".into()))
    }
}
