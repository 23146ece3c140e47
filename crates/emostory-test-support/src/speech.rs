//! Test speech backends: mock `SpeechBackend` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use emostory_core::error::CollaboratorError;
use emostory_core::speech::{SpeechBackend, Utterance, Voice};

/// A speech backend that records every utterance it starts and "speaks" each
/// one for a fixed duration on the Tokio clock.
#[derive(Debug)]
pub struct RecordingSpeechBackend {
    started: Mutex<Vec<Utterance>>,
    finished: Mutex<Vec<String>>,
    voices: Vec<Voice>,
    speaking_time: Duration,
    fail: bool,
    cancels: AtomicUsize,
    pauses: AtomicUsize,
    resumes: AtomicUsize,
}

impl Default for RecordingSpeechBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSpeechBackend {
    /// Create a backend whose utterances last 200ms each.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
            voices: Vec::new(),
            speaking_time: Duration::from_millis(200),
            fail: false,
            cancels: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
        }
    }

    /// Override how long each utterance lasts.
    #[must_use]
    pub fn with_speaking_time(mut self, speaking_time: Duration) -> Self {
        self.speaking_time = speaking_time;
        self
    }

    /// Advertise the given voices.
    #[must_use]
    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    /// Make every utterance fail after it starts.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Utterances that reached the backend, in start order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn utterances(&self) -> Vec<Utterance> {
        self.started.lock().unwrap().clone()
    }

    /// Texts of the utterances that reached the backend, in start order.
    pub fn spoken_texts(&self) -> Vec<String> {
        self.utterances().into_iter().map(|u| u.text).collect()
    }

    /// Texts of the utterances that played to their natural end.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn finished_texts(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    /// Number of `cancel` calls.
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Number of `pause` calls.
    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    /// Number of `resume` calls.
    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackend for RecordingSpeechBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn utter(&self, utterance: Utterance) -> Result<(), CollaboratorError> {
        let text = utterance.text.clone();
        self.started.lock().unwrap().push(utterance);
        if self.fail {
            return Err(CollaboratorError::Infrastructure("synthesis failed".into()));
        }
        tokio::time::sleep(self.speaking_time).await;
        self.finished.lock().unwrap().push(text);
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A backend for hosts without speech synthesis.
#[derive(Debug)]
pub struct UnsupportedSpeechBackend;

#[async_trait]
impl SpeechBackend for UnsupportedSpeechBackend {
    fn is_supported(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    async fn utter(&self, _utterance: Utterance) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unsupported("speech synthesis".into()))
    }

    fn cancel(&self) {}

    fn pause(&self) {}

    fn resume(&self) {}
}
