//! EmoStory: command-line host.
//!
//! Wires the playback engine to a logging speech backend, a simulated affect
//! device and an in-memory profile store, then plays one scenario from start
//! to exit.

pub mod config;
pub mod error;
pub mod profiles;
pub mod runner;
pub mod state;
