//! Scenario content: a short story, its response choices, and catalog metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A response the child can pick after the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable identifier, unique within its scenario.
    pub id: String,
    /// Text read out and shown on the choice button.
    pub text: String,
    /// Whether this is a prosocial choice.
    pub is_good: bool,
}

/// Catalog difficulty tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A social-emotional scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier used to start a playthrough.
    pub id: String,
    /// Display and narration title.
    pub title: String,
    /// One-line catalog description.
    #[serde(default)]
    pub description: String,
    /// Catalog grouping, e.g. "Sharing with Friends".
    #[serde(default)]
    pub category: String,
    /// Catalog difficulty.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// The narrated story.
    pub story: String,
    /// Available responses, in presentation order.
    pub choices: Vec<Choice>,
}

/// Structural problems in scenario content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioValidationError {
    #[error("scenario id must not be blank")]
    BlankId,

    #[error("scenario {0} has a blank title")]
    BlankTitle(String),

    #[error("scenario {0} has no choices")]
    NoChoices(String),

    #[error("scenario {scenario_id} has a choice with a blank id")]
    BlankChoiceId { scenario_id: String },

    #[error("scenario {scenario_id} repeats choice id {choice_id}")]
    DuplicateChoice {
        scenario_id: String,
        choice_id: String,
    },
}

impl Scenario {
    /// Looks up a choice by id.
    #[must_use]
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// Checks the structural invariants the playthrough relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ScenarioValidationError> {
        if self.id.trim().is_empty() {
            return Err(ScenarioValidationError::BlankId);
        }
        if self.title.trim().is_empty() {
            return Err(ScenarioValidationError::BlankTitle(self.id.clone()));
        }
        if self.choices.is_empty() {
            return Err(ScenarioValidationError::NoChoices(self.id.clone()));
        }
        for (index, choice) in self.choices.iter().enumerate() {
            if choice.id.trim().is_empty() {
                return Err(ScenarioValidationError::BlankChoiceId {
                    scenario_id: self.id.clone(),
                });
            }
            if self.choices[..index].iter().any(|c| c.id == choice.id) {
                return Err(ScenarioValidationError::DuplicateChoice {
                    scenario_id: self.id.clone(),
                    choice_id: choice.id.clone(),
                });
            }
        }
        Ok(())
    }
}
