//! EmoStory Core: shared abstractions for scenario playback.
//!
//! This crate defines the types every other crate agrees on: emotions, the
//! error taxonomy, session event metadata, and the ports through which the
//! engine reaches its external collaborators (profiles, accessibility
//! settings, speech output, affect capture). It contains no I/O.

pub mod affect;
pub mod clock;
pub mod emotion;
pub mod error;
pub mod event;
pub mod profile;
pub mod rng;
pub mod settings;
pub mod speech;
