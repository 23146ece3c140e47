//! Test affect devices: mock `AffectDevice` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use emostory_core::affect::AffectDevice;
use emostory_core::emotion::EmotionSample;
use emostory_core::error::CollaboratorError;

/// A device that reports a scripted sample while armed and counts
/// arm/disarm calls.
#[derive(Debug, Default)]
pub struct ScriptedAffectDevice {
    sample: Mutex<Option<EmotionSample>>,
    armed: AtomicBool,
    arms: AtomicUsize,
    disarms: AtomicUsize,
}

impl ScriptedAffectDevice {
    /// Create a device that reports `sample` whenever armed.
    #[must_use]
    pub fn new(sample: Option<EmotionSample>) -> Self {
        Self {
            sample: Mutex::new(sample),
            ..Self::default()
        }
    }

    /// Change the sample reported from now on.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_sample(&self, sample: Option<EmotionSample>) {
        *self.sample.lock().unwrap() = sample;
    }

    /// Whether the device is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Number of successful `arm` calls.
    pub fn arm_count(&self) -> usize {
        self.arms.load(Ordering::SeqCst)
    }

    /// Number of `disarm` calls.
    pub fn disarm_count(&self) -> usize {
        self.disarms.load(Ordering::SeqCst)
    }
}

impl AffectDevice for ScriptedAffectDevice {
    fn arm(&self) -> Result<(), CollaboratorError> {
        self.armed.store(true, Ordering::SeqCst);
        self.arms.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.disarms.fetch_add(1, Ordering::SeqCst);
    }

    fn latest_sample(&self) -> Option<EmotionSample> {
        if self.is_armed() {
            *self.sample.lock().unwrap()
        } else {
            None
        }
    }
}

/// A device that can never be armed, as when camera permission is denied.
#[derive(Debug)]
pub struct UnavailableAffectDevice;

impl AffectDevice for UnavailableAffectDevice {
    fn arm(&self) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported("camera permission denied".into()))
    }

    fn disarm(&self) {}

    fn latest_sample(&self) -> Option<EmotionSample> {
        None
    }
}
