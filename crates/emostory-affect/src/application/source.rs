//! Exclusive access to the affect device.
//!
//! A session obtains an `AffectLease` from the shared `AffectSource`; while
//! the lease lives no other session can arm the device. Dropping the lease
//! disarms the device and frees it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use emostory_core::affect::AffectDevice;
use emostory_core::emotion::EmotionSample;
use emostory_core::error::EngineError;
use tracing::{debug, warn};
use uuid::Uuid;

struct Inner {
    device: Arc<dyn AffectDevice>,
    holder: Mutex<Option<Uuid>>,
}

impl Inner {
    fn release(&self, session_id: Uuid) {
        let mut holder = self.holder.lock().unwrap_or_else(PoisonError::into_inner);
        if *holder == Some(session_id) {
            *holder = None;
            debug!(%session_id, "affect source released");
        }
    }
}

/// Shared handle to the affect device. Cheap to clone.
#[derive(Clone)]
pub struct AffectSource {
    inner: Arc<Inner>,
}

impl fmt::Debug for AffectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffectSource")
            .field("holder", &self.holder())
            .finish_non_exhaustive()
    }
}

impl AffectSource {
    /// Wraps `device`.
    #[must_use]
    pub fn new(device: Arc<dyn AffectDevice>) -> Self {
        Self {
            inner: Arc::new(Inner {
                device,
                holder: Mutex::new(None),
            }),
        }
    }

    /// Claims the device for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AffectSourceUnavailable` if another session holds it.
    pub fn lease(&self, session_id: Uuid) -> Result<AffectLease, EngineError> {
        let mut holder = self
            .inner
            .holder
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = *holder {
            return Err(EngineError::AffectSourceUnavailable(format!(
                "held by session {current}"
            )));
        }
        *holder = Some(session_id);
        debug!(%session_id, "affect source leased");
        Ok(AffectLease {
            inner: Arc::clone(&self.inner),
            session_id,
            armed: AtomicBool::new(false),
        })
    }

    /// The session currently holding the device.
    #[must_use]
    pub fn holder(&self) -> Option<Uuid> {
        *self
            .inner
            .holder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// One session's exclusive claim on the affect device.
pub struct AffectLease {
    inner: Arc<Inner>,
    session_id: Uuid,
    armed: AtomicBool,
}

impl fmt::Debug for AffectLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffectLease")
            .field("session_id", &self.session_id)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

impl AffectLease {
    /// Arms the device. Idempotent while armed.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AffectSourceUnavailable` if the device refuses to arm.
    pub fn start(&self) -> Result<(), EngineError> {
        if self.is_armed() {
            return Ok(());
        }
        self.inner.device.arm().map_err(|error| {
            warn!(session_id = %self.session_id, %error, "affect device failed to arm");
            EngineError::AffectSourceUnavailable(error.to_string())
        })?;
        self.armed.store(true, Ordering::SeqCst);
        debug!(session_id = %self.session_id, "affect sampling started");
        Ok(())
    }

    /// Disarms the device. Idempotent.
    pub fn stop(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.inner.device.disarm();
            debug!(session_id = %self.session_id, "affect sampling stopped");
        }
    }

    /// The latest sample, or `None` when disarmed or nothing has arrived yet.
    #[must_use]
    pub fn latest_sample(&self) -> Option<EmotionSample> {
        if self.is_armed() {
            self.inner.device.latest_sample()
        } else {
            None
        }
    }

    /// Whether this lease has the device armed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// The owning session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Drop for AffectLease {
    fn drop(&mut self) {
        self.stop();
        self.inner.release(self.session_id);
    }
}
