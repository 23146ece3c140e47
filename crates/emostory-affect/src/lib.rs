//! EmoStory: Affect Capture.
//!
//! Wraps an `AffectDevice` so that only one playthrough session can hold it
//! armed at a time, and provides a simulated device that stands in for real
//! facial-expression recognition.

pub mod application;
pub mod simulated;

pub use application::source::{AffectLease, AffectSource};
pub use simulated::SimulatedAffectDevice;
