//! In-memory profile store for the command-line host.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use emostory_core::clock::SharedClock;
use emostory_core::error::CollaboratorError;
use emostory_core::profile::{Profile, ProfileStore, ProgressPatch};
use tracing::debug;
use uuid::Uuid;

/// Profiles kept for the lifetime of the process.
pub struct InMemoryProfileStore {
    clock: SharedClock,
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl std::fmt::Debug for InMemoryProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProfileStore")
            .field("profiles", &self.profiles().len())
            .finish_non_exhaustive()
    }
}

impl InMemoryProfileStore {
    /// An empty store stamping activity with `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            profiles: Mutex::new(HashMap::new()),
        }
    }

    /// Creates and stores a profile with no completed scenarios.
    #[must_use = "the profile id is needed to start a session"]
    pub fn create(&self, name: &str) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            scenarios_completed: 0,
            last_active: self.clock.now(),
        };
        self.profiles().insert(profile.id, profile.clone());
        debug!(profile_id = %profile.id, name, "profile created");
        profile
    }

    /// The stored profile, if present.
    #[must_use]
    pub fn find(&self, profile_id: Uuid) -> Option<Profile> {
        self.profiles().get(&profile_id).cloned()
    }

    fn profiles(&self) -> MutexGuard<'_, HashMap<Uuid, Profile>> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, profile_id: Uuid) -> Result<Profile, CollaboratorError> {
        self.find(profile_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("profile {profile_id}")))
    }

    async fn apply_patch(
        &self,
        profile_id: Uuid,
        patch: ProgressPatch,
    ) -> Result<(), CollaboratorError> {
        let now = self.clock.now();
        let mut profiles = self.profiles();
        let profile = profiles
            .get_mut(&profile_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("profile {profile_id}")))?;
        patch.apply_to(profile);
        profile.last_active = now;
        debug!(%profile_id, scenarios_completed = profile.scenarios_completed, "profile patched");
        Ok(())
    }
}
