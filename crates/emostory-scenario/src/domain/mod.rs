//! Domain layer for the Scenario Playback context.

pub mod events;
pub mod narration;
pub mod playthrough;
pub mod scenario;
