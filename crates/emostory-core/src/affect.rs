//! Affect capture device port.
//!
//! The detection algorithm behind a device is opaque. Samples follow
//! last-known-value semantics: `latest_sample` returns whatever the device
//! most recently produced, not a guaranteed-fresh reading.

use crate::emotion::EmotionSample;
use crate::error::CollaboratorError;

/// A device producing emotion samples while armed.
pub trait AffectDevice: Send + Sync {
    /// Begin sampling.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError` if the device cannot start (permission
    /// denied, no camera, no runtime).
    fn arm(&self) -> Result<(), CollaboratorError>;

    /// Stop sampling and forget the last sample.
    fn disarm(&self);

    /// The most recent sample, if any arrived since arming.
    fn latest_sample(&self) -> Option<EmotionSample>;
}
