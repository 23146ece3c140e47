//! Application layer for the Affect Capture context.

pub mod source;
