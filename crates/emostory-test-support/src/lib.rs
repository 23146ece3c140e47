//! Shared test fakes and utilities for the EmoStory playback engine.

mod affect;
mod clock;
mod profile;
mod rng;
mod speech;

pub use affect::{ScriptedAffectDevice, UnavailableAffectDevice};
pub use clock::{FixedClock, fixed_now};
pub use profile::{FailingProfileStore, RecordingProfileStore, sample_profile};
pub use rng::SequenceRng;
pub use speech::{RecordingSpeechBackend, UnsupportedSpeechBackend};
