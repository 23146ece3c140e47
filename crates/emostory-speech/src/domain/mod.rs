//! Domain types for the Speech Orchestration context.

pub mod emphasis;
pub mod voice;
