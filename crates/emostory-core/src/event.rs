//! Session event abstractions.
//!
//! Every observable step of a playthrough is journaled as an event carrying
//! this metadata. The journal is in-memory and discarded with the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name, e.g. `scenario.phase_entered`.
    pub event_type: String,
    /// The playthrough session this event belongs to.
    pub session_id: Uuid,
    /// Monotonically increasing position within the session journal, from 1.
    pub sequence_number: u64,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all session events implement.
pub trait SessionEventEnvelope: Send + Sync + std::fmt::Debug {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}
