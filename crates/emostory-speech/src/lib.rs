//! EmoStory: Speech Orchestration.
//!
//! Responsible for turning narration requests into utterances on a
//! `SpeechBackend`, guaranteeing that at most one utterance is audible at a
//! time and that accessibility settings are honoured on every call.

pub mod application;
pub mod domain;
pub mod tracing_backend;

pub use application::orchestrator::SpeechOrchestrator;
pub use domain::emphasis::{Emphasis, SpeakOptions};
