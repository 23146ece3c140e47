//! A speech backend that narrates into the log.
//!
//! Used by the CLI on hosts without a synthesizer: each utterance is emitted
//! as a structured `tracing` event and "lasts" as long as it would take to
//! read aloud at the requested rate. Pausing stops that clock until resumed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use emostory_core::error::CollaboratorError;
use emostory_core::speech::{SpeechBackend, Utterance, Voice};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

/// Milliseconds per word at rate 1.0.
const MILLIS_PER_WORD: f32 = 380.0;

/// Logs utterances instead of synthesizing audio.
#[derive(Debug, Clone)]
pub struct TracingSpeechBackend {
    voices: Vec<Voice>,
    paused: Arc<watch::Sender<bool>>,
}

impl Default for TracingSpeechBackend {
    fn default() -> Self {
        Self {
            voices: vec![
                Voice {
                    name: "Samantha".to_owned(),
                    lang: "en-US".to_owned(),
                },
                Voice {
                    name: "Daniel".to_owned(),
                    lang: "en-GB".to_owned(),
                },
            ],
            paused: Arc::new(watch::Sender::new(false)),
        }
    }
}

/// How long `utterance` takes to read aloud.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn reading_time(utterance: &Utterance) -> Duration {
    let words = utterance.text.split_whitespace().count().max(1) as f32;
    let rate = if utterance.rate > 0.0 { utterance.rate } else { 1.0 };
    Duration::from_millis((words * MILLIS_PER_WORD / rate) as u64)
}

#[async_trait]
impl SpeechBackend for TracingSpeechBackend {
    fn is_supported(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    async fn utter(&self, utterance: Utterance) -> Result<(), CollaboratorError> {
        info!(
            text = %utterance.text,
            voice = utterance.voice.as_ref().map_or("default", |v| v.name.as_str()),
            rate = utterance.rate,
            pitch = utterance.pitch,
            "narrating"
        );
        let mut remaining = reading_time(&utterance);
        let mut paused = self.paused.subscribe();
        loop {
            if *paused.borrow_and_update() {
                if paused.wait_for(|p| !*p).await.is_err() {
                    break;
                }
                continue;
            }
            let started = Instant::now();
            tokio::select! {
                () = tokio::time::sleep(remaining) => break,
                changed = paused.changed() => {
                    remaining = remaining.saturating_sub(started.elapsed());
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn cancel(&self) {
        self.paused.send_replace(false);
        info!("narration cancelled");
    }

    fn pause(&self) {
        self.paused.send_replace(true);
        info!("narration paused");
    }

    fn resume(&self) {
        self.paused.send_replace(false);
        info!("narration resumed");
    }
}
