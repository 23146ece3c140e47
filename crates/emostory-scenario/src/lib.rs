//! EmoStory: Scenario Playback.
//!
//! Responsible for a single scenario playthrough: intro narration, choice
//! collection, affect capture at confirmation time, feedback, and crediting
//! progress exactly once on a good outcome.

pub mod application;
pub mod domain;

pub use application::catalog::{CatalogError, InMemoryCatalog, ScenarioCatalog};
pub use application::engine::{EngineConfig, EngineDeps, PlaythroughView, ScenarioEngine};
pub use domain::events::{SessionEvent, SessionEventKind, SessionExit};
pub use domain::playthrough::{Phase, SelectOutcome};
pub use domain::scenario::{Choice, Difficulty, Scenario};
