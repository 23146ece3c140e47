//! Shared test helpers for playthrough integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use emostory_cli::config::AppConfig;
use emostory_cli::state::AppState;
use emostory_core::emotion::{Emotion, EmotionSample};
use emostory_test_support::{FixedClock, RecordingSpeechBackend, ScriptedAffectDevice, fixed_now};

/// A host wired to recording fakes.
pub struct TestApp {
    pub state: AppState,
    pub speech: Arc<RecordingSpeechBackend>,
    pub device: Arc<ScriptedAffectDevice>,
}

/// Builds a configuration from the given variables, defaults elsewhere.
pub fn config(vars: &[(&str, &str)]) -> AppConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// An expression sample the scripted camera will report once armed.
pub fn expression(emotion: Emotion, confidence: f32) -> Option<EmotionSample> {
    Some(EmotionSample::new(emotion, confidence))
}

/// Build the host with a recording speech backend, a scripted affect device
/// and a fixed clock.
pub fn build_test_app(config: &AppConfig, sample: Option<EmotionSample>) -> TestApp {
    let speech = Arc::new(RecordingSpeechBackend::new());
    let device = Arc::new(ScriptedAffectDevice::new(sample));
    let state = AppState::with_backends(
        config,
        speech.clone(),
        device.clone(),
        Arc::new(FixedClock(fixed_now())),
    )
    .unwrap();
    TestApp {
        state,
        speech,
        device,
    }
}

/// Counts journal payloads of the given type.
pub fn count_events(events: &[serde_json::Value], event_type: &str) -> usize {
    events.iter().filter(|e| e["type"] == event_type).count()
}
