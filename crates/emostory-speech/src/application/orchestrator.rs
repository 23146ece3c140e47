//! The speech orchestrator.
//!
//! Interrupt semantics: every `speak` cancels the utterance in progress
//! before starting its own. Each utterance runs as a spawned task racing the
//! backend's `utter` future against a per-utterance cancellation token, and
//! completes under a lease so a late finish from a cancelled utterance can
//! never clear the speaking flag of its successor.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use emostory_core::error::EngineError;
use emostory_core::settings::{AccessibilitySettings, AccessibilitySettingsSource};
use emostory_core::speech::{SpeechBackend, Utterance};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::emphasis::{DEFAULT_PITCH, DEFAULT_RATE, DEFAULT_VOLUME, Emphasis, SpeakOptions};
use crate::domain::voice::child_friendly_voice;

struct ActiveUtterance {
    lease: u64,
    cancel: CancellationToken,
}

struct Inner {
    backend: Arc<dyn SpeechBackend>,
    settings: Arc<dyn AccessibilitySettingsSource>,
    active: Mutex<Option<ActiveUtterance>>,
    lease_counter: AtomicU64,
    paused: AtomicBool,
    speaking_tx: watch::Sender<bool>,
}

impl Inner {
    fn active(&self) -> std::sync::MutexGuard<'_, Option<ActiveUtterance>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clears the active utterance if `lease` still owns it.
    fn finish(&self, lease: u64) {
        let mut active = self.active();
        if active.as_ref().is_some_and(|a| a.lease == lease) {
            *active = None;
            self.paused.store(false, Ordering::SeqCst);
            self.speaking_tx.send_replace(false);
        } else {
            debug!(lease, "ignoring stale utterance completion");
        }
    }
}

/// Serializes spoken output so at most one utterance is audible at a time.
///
/// Cheap to clone; clones share the same backend and speaking state.
#[derive(Clone)]
pub struct SpeechOrchestrator {
    inner: Arc<Inner>,
}

impl fmt::Debug for SpeechOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechOrchestrator")
            .field("is_speaking", &self.is_speaking())
            .field("is_paused", &self.inner.paused.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SpeechOrchestrator {
    /// Creates an orchestrator over `backend`, consulting `settings` on every call.
    #[must_use]
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        settings: Arc<dyn AccessibilitySettingsSource>,
    ) -> Self {
        let (speaking_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                backend,
                settings,
                active: Mutex::new(None),
                lease_counter: AtomicU64::new(0),
                paused: AtomicBool::new(false),
                speaking_tx,
            }),
        }
    }

    /// Speaks `text`, cancelling any utterance in progress.
    ///
    /// Returns `true` if an utterance was started. Blank text, an unsupported
    /// backend, disabled speech, or a missing Tokio runtime make this a silent
    /// no-op returning `false`.
    pub fn speak(&self, text: &str, options: SpeakOptions) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let settings = self.inner.settings.snapshot();
        if let Err(error) = self.check_available(&settings) {
            debug!(%error, "staying silent");
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime available for speech; staying silent");
            return false;
        };

        let utterance = self.resolve(text, options, &settings);
        let cancel = CancellationToken::new();
        let lease = self.inner.lease_counter.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut active = self.inner.active();
            if let Some(previous) = active.replace(ActiveUtterance {
                lease,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
                self.inner.backend.cancel();
                debug!(lease = previous.lease, "utterance interrupted");
            }
            self.inner.paused.store(false, Ordering::SeqCst);
            self.inner.speaking_tx.send_replace(true);
        }

        debug!(
            lease,
            text = %utterance.text,
            rate = utterance.rate,
            pitch = utterance.pitch,
            "utterance started"
        );

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = inner.backend.utter(utterance) => Some(result),
            };
            match outcome {
                None => debug!(lease, "utterance cancelled"),
                Some(Ok(())) => debug!(lease, "utterance finished"),
                Some(Err(error)) => warn!(lease, %error, "utterance failed"),
            }
            inner.finish(lease);
        });

        true
    }

    /// Speaks `text` with a preset rate/pitch profile.
    pub fn speak_with_emphasis(&self, text: &str, emphasis: Emphasis) -> bool {
        self.speak(text, emphasis.options())
    }

    /// Speaks a step-by-step instruction, slowly and at neutral pitch.
    pub fn speak_instruction(&self, text: &str) -> bool {
        self.speak(
            &format!("Instruction: {text}"),
            SpeakOptions {
                rate: Some(0.85),
                pitch: Some(1.0),
                ..SpeakOptions::default()
            },
        )
    }

    /// Speaks praise with the excited preset.
    pub fn speak_encouragement(&self, text: &str) -> bool {
        self.speak_with_emphasis(&format!("Great job! {text}"), Emphasis::Excited)
    }

    /// Cancels the utterance in progress, if any. Idempotent.
    pub fn stop(&self) {
        let mut active = self.inner.active();
        if let Some(previous) = active.take() {
            previous.cancel.cancel();
            self.inner.backend.cancel();
            debug!(lease = previous.lease, "utterance stopped");
        }
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.speaking_tx.send_replace(false);
    }

    /// Suspends the current utterance. No-op when nothing is playing.
    pub fn pause(&self) {
        let active = self.inner.active();
        if active.is_some() && !self.inner.paused.swap(true, Ordering::SeqCst) {
            self.inner.backend.pause();
        }
    }

    /// Continues a paused utterance. No-op unless paused.
    pub fn resume(&self) {
        let active = self.inner.active();
        if active.is_some() && self.inner.paused.swap(false, Ordering::SeqCst) {
            self.inner.backend.resume();
        }
    }

    /// Whether an utterance is currently audible (or paused mid-way).
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        *self.inner.speaking_tx.borrow()
    }

    /// Whether the current utterance is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Observe `is_speaking` transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.speaking_tx.subscribe()
    }

    /// Whether the backend can speak on this host.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.inner.backend.is_supported()
    }

    /// Checks that narration can be heard right now.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SpeechUnavailable` when the backend is
    /// unsupported or speech is turned off in the accessibility settings.
    pub fn availability(&self) -> Result<(), EngineError> {
        self.check_available(&self.inner.settings.snapshot())
    }

    fn check_available(&self, settings: &AccessibilitySettings) -> Result<(), EngineError> {
        if !self.inner.backend.is_supported() {
            return Err(EngineError::SpeechUnavailable(
                "speech backend unsupported".to_owned(),
            ));
        }
        if !settings.speech_enabled {
            return Err(EngineError::SpeechUnavailable(
                "speech disabled by accessibility settings".to_owned(),
            ));
        }
        Ok(())
    }

    fn resolve(
        &self,
        text: &str,
        options: SpeakOptions,
        settings: &AccessibilitySettings,
    ) -> Utterance {
        let settings_rate = (settings.narration_speed > 0.0).then_some(settings.narration_speed);
        Utterance {
            text: text.trim().to_owned(),
            rate: options.rate.or(settings_rate).unwrap_or(DEFAULT_RATE),
            pitch: options.pitch.unwrap_or(DEFAULT_PITCH),
            volume: options.volume.unwrap_or(DEFAULT_VOLUME).clamp(0.0, 1.0),
            priority: options.priority,
            voice: options
                .voice
                .or_else(|| child_friendly_voice(&self.inner.backend.voices())),
        }
    }
}
