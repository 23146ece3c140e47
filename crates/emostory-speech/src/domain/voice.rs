//! Voice selection.

use emostory_core::speech::Voice;

/// Name fragments of voices that sound friendly to young children.
const PREFERRED_VOICE_HINTS: [&str; 4] = ["female", "woman", "zira", "samantha"];

/// Picks a child-friendly voice: a preferred voice if installed, otherwise
/// the first English voice, otherwise the first voice at all.
#[must_use]
pub fn child_friendly_voice(voices: &[Voice]) -> Option<Voice> {
    voices
        .iter()
        .find(|voice| {
            let name = voice.name.to_lowercase();
            PREFERRED_VOICE_HINTS.iter().any(|hint| name.contains(hint))
        })
        .or_else(|| voices.iter().find(|voice| voice.lang.starts_with("en")))
        .or_else(|| voices.first())
        .cloned()
}
