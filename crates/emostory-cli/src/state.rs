//! Shared application state.

use std::sync::Arc;

use emostory_affect::{AffectSource, SimulatedAffectDevice};
use emostory_core::affect::AffectDevice;
use emostory_core::clock::{SharedClock, SystemClock};
use emostory_core::rng::StdDeterministicRng;
use emostory_core::settings::{AccessibilitySettingsSource, SharedSettings};
use emostory_core::speech::SpeechBackend;
use emostory_scenario::{EngineConfig, EngineDeps, InMemoryCatalog};
use emostory_speech::SpeechOrchestrator;
use emostory_speech::tracing_backend::TracingSpeechBackend;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::profiles::InMemoryProfileStore;

/// Everything a playthrough needs, built once per process.
pub struct AppState {
    pub catalog: InMemoryCatalog,
    pub profiles: Arc<InMemoryProfileStore>,
    pub settings: SharedSettings,
    pub deps: EngineDeps,
    pub engine: EngineConfig,
}

impl AppState {
    /// Builds the production wiring: logged speech, simulated affect, and the
    /// built-in catalog merged with the optional YAML file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Catalog` if the YAML file cannot be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let rng = match config.affect_seed {
            Some(seed) => StdDeterministicRng::seeded(seed),
            None => StdDeterministicRng::from_entropy(),
        };
        let device = Arc::new(SimulatedAffectDevice::new(Box::new(rng)));
        Self::with_backends(
            config,
            Arc::new(TracingSpeechBackend::default()),
            device,
            Arc::new(SystemClock),
        )
    }

    /// Builds the state around the given speech backend, affect device and clock.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Catalog` if the YAML file cannot be loaded.
    pub fn with_backends(
        config: &AppConfig,
        speech: Arc<dyn SpeechBackend>,
        device: Arc<dyn AffectDevice>,
        clock: SharedClock,
    ) -> Result<Self, AppError> {
        let catalog = match &config.scenarios_file {
            Some(path) => {
                InMemoryCatalog::built_in().merge(InMemoryCatalog::from_yaml_file(path)?)?
            }
            None => InMemoryCatalog::built_in(),
        };
        info!(scenarios = catalog.len(), "scenario catalog ready");

        let settings = SharedSettings::new(config.settings);
        let settings_source: Arc<dyn AccessibilitySettingsSource> = Arc::new(settings.clone());
        let profiles = Arc::new(InMemoryProfileStore::new(Arc::clone(&clock)));

        let deps = EngineDeps {
            speech: SpeechOrchestrator::new(speech, Arc::clone(&settings_source)),
            affect: AffectSource::new(device),
            profiles: profiles.clone(),
            settings: settings_source,
            clock,
        };

        Ok(Self {
            catalog,
            profiles,
            settings,
            deps,
            engine: config.engine,
        })
    }
}
