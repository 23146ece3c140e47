//! Spoken lines for each step of a playthrough.

use super::scenario::{Choice, Scenario};

/// Spoken after the choices settle onto the screen.
pub const CHOICES_PROMPT: &str =
    "Look at the camera so I can see your expressions! Now, what would you do?";

/// Spoken when the child returns to the choices after feedback.
pub const RETRY_PROMPT: &str = "Let's try again! What would you do?";

/// Outcome narration after a good choice.
pub const SUCCESS_OUTCOME: &str =
    "Look how happy everyone is! Making good choices helps everyone feel better. Great job!";

/// Outcome narration after a poor choice.
pub const ENCOURAGING_OUTCOME: &str =
    "This choice made someone feel sad. But that's okay - we can learn and try again!";

/// Spoken when leaving for another scenario.
pub const PLAY_ANOTHER: &str = "Let's choose another story to practice!";

/// Spoken when leaving for the profile screen.
pub const GO_HOME: &str = "Going back to choose profiles";

/// The intro utterance: title announcement and the story, with the
/// catalog description appended when enhanced narration is on.
#[must_use]
pub fn intro(scenario: &Scenario, enhanced: bool) -> String {
    let mut text = format!(
        "Starting {}. Listen carefully to the story! {}",
        scenario.title, scenario.story
    );
    if enhanced {
        text.push_str(" Description: Interactive scenario: ");
        text.push_str(&scenario.title);
        text.push_str(". You'll make choices and practice facial expressions.");
    }
    text
}

/// Echo of the child's selection.
#[must_use]
pub fn selection_echo(choice: &Choice) -> String {
    format!("You chose: {}", choice.text)
}

/// Outcome narration for the confirmed choice.
#[must_use]
pub fn outcome(choice_is_good: bool) -> &'static str {
    if choice_is_good {
        SUCCESS_OUTCOME
    } else {
        ENCOURAGING_OUTCOME
    }
}
