//! Application layer for the Scenario Playback context.

pub mod catalog;
pub mod engine;
