//! Domain rules for the Affect Feedback context.

pub mod cue;
pub mod policy;
