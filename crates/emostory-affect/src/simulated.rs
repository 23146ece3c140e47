//! Simulated affect device.
//!
//! Stands in for facial-expression recognition: after a processing delay
//! following `arm`, it publishes one uniformly drawn emotion with a
//! confidence in `[0.6, 1.0)`. No accuracy is implied.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use emostory_core::affect::AffectDevice;
use emostory_core::emotion::{Emotion, EmotionSample};
use emostory_core::error::CollaboratorError;
use emostory_core::rng::DeterministicRng;
use tokio::runtime::Handle;
use tracing::debug;

/// Delay between arming and the first sample.
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(1000);

const MIN_CONFIDENCE: f64 = 0.6;
const CONFIDENCE_SPAN: f64 = 0.4;

#[derive(Debug, Default)]
struct SimState {
    generation: u64,
    armed: bool,
    sample: Option<EmotionSample>,
}

struct SimInner {
    rng: Mutex<Box<dyn DeterministicRng>>,
    state: Mutex<SimState>,
    processing_delay: Duration,
}

impl SimInner {
    fn state(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw(&self) -> EmotionSample {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let last = u32::try_from(Emotion::ALL.len() - 1).unwrap_or(0);
        let index = rng.next_u32_range(0, last) as usize;
        let emotion = Emotion::ALL[index.min(Emotion::ALL.len() - 1)];
        let confidence = MIN_CONFIDENCE + rng.next_f64() * CONFIDENCE_SPAN;
        EmotionSample::new(emotion, confidence as f32)
    }
}

/// An `AffectDevice` producing random emotions from an injected RNG.
#[derive(Clone)]
pub struct SimulatedAffectDevice {
    inner: Arc<SimInner>,
}

impl fmt::Debug for SimulatedAffectDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedAffectDevice")
            .field("processing_delay", &self.inner.processing_delay)
            .field("state", &*self.inner.state())
            .finish_non_exhaustive()
    }
}

impl SimulatedAffectDevice {
    /// Creates a device using the default processing delay.
    #[must_use]
    pub fn new(rng: Box<dyn DeterministicRng>) -> Self {
        Self::with_processing_delay(rng, DEFAULT_PROCESSING_DELAY)
    }

    /// Creates a device with a custom processing delay.
    #[must_use]
    pub fn with_processing_delay(rng: Box<dyn DeterministicRng>, processing_delay: Duration) -> Self {
        Self {
            inner: Arc::new(SimInner {
                rng: Mutex::new(rng),
                state: Mutex::new(SimState::default()),
                processing_delay,
            }),
        }
    }
}

impl AffectDevice for SimulatedAffectDevice {
    fn arm(&self) -> Result<(), CollaboratorError> {
        let runtime = Handle::try_current()
            .map_err(|_| CollaboratorError::Unsupported("no async runtime for sampling".into()))?;

        let generation = {
            let mut state = self.inner.state();
            state.generation += 1;
            state.armed = true;
            state.sample = None;
            state.generation
        };

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(inner.processing_delay).await;
            let sample = inner.draw();
            let mut state = inner.state();
            if state.armed && state.generation == generation {
                debug!(emotion = %sample.emotion, confidence = sample.confidence, "expression detected");
                state.sample = Some(sample);
            }
        });
        Ok(())
    }

    fn disarm(&self) {
        let mut state = self.inner.state();
        state.generation += 1;
        state.armed = false;
        state.sample = None;
    }

    fn latest_sample(&self) -> Option<EmotionSample> {
        self.inner.state().sample
    }
}

#[cfg(test)]
mod tests {
    use emostory_test_support::SequenceRng;

    use super::*;

    fn device(values: Vec<u32>, fractions: Vec<f64>) -> SimulatedAffectDevice {
        SimulatedAffectDevice::new(Box::new(
            SequenceRng::new(values).with_fractions(fractions),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_arrives_after_processing_delay() {
        // Arrange
        let device = device(vec![4], vec![0.5]);

        // Act
        device.arm().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        let early = device.latest_sample();
        tokio::time::sleep(Duration::from_millis(600)).await;
        let late = device.latest_sample();

        // Assert
        assert!(early.is_none());
        let sample = late.unwrap();
        assert_eq!(sample.emotion, Emotion::Excited);
        assert!((sample.confidence - 0.8).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_clears_sample() {
        let device = device(vec![0], vec![0.0]);

        device.arm().unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            device.latest_sample().map(|s| s.emotion),
            Some(Emotion::Happy)
        );
        device.disarm();

        assert!(device.latest_sample().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_detection_is_discarded_after_rearm() {
        // Arrange: the first arm's detection must not land after a re-arm.
        let device = device(vec![2, 1], vec![0.0, 0.0]);

        // Act
        device.arm().unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        device.disarm();
        device.arm().unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        let after_stale = device.latest_sample();
        tokio::time::sleep(Duration::from_millis(400)).await;
        let fresh = device.latest_sample();

        // Assert
        assert!(after_stale.is_none());
        assert_eq!(fresh.map(|s| s.emotion), Some(Emotion::Neutral));
    }

    #[test]
    fn test_arm_without_runtime_is_unsupported() {
        let device = device(vec![], vec![]);
        assert!(matches!(
            device.arm(),
            Err(CollaboratorError::Unsupported(_))
        ));
    }
}
