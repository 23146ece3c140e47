//! Application layer for the Speech Orchestration context.

pub mod orchestrator;
