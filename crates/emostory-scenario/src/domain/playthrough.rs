//! The playthrough state machine.
//!
//! Pure and synchronous: it decides which transitions are legal and what they
//! change. Timers, speech and affect capture are driven around it by the
//! engine. Every phase entry bumps a generation counter; a deferred action
//! scheduled under an older generation is stale and must be dropped.

use std::sync::Arc;

use emostory_core::emotion::EmotionSample;
use emostory_core::error::EngineError;
use emostory_feedback::{Feedback, FeedbackEngine};
use serde::{Deserialize, Serialize};

use super::events::SessionExit;
use super::scenario::{Choice, Scenario};

/// Phase of a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// The story is being narrated.
    Intro,
    /// The child is picking a response.
    Choices,
    /// Feedback on the confirmed choice is shown.
    Feedback,
    /// The consequence of the choice is shown.
    Outcome,
}

impl Phase {
    /// Lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Phase::Intro => "intro",
            Phase::Choices => "choices",
            Phase::Feedback => "feedback",
            Phase::Outcome => "outcome",
        }
    }
}

/// Result of a selection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The choice was recorded.
    Accepted(Choice),
    /// A choice was already recorded for this visit to the choices; ignored.
    AlreadySelected,
}

/// Result of entering the outcome phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeEntry {
    /// Whether the confirmed choice was good.
    pub choice_is_good: bool,
    /// Whether this entry should credit progress. True at most once per session.
    pub credit: bool,
    /// Whether the session was already in the outcome phase.
    pub reentry: bool,
}

/// State of one scenario playthrough.
#[derive(Debug, Clone)]
pub struct Playthrough {
    scenario: Arc<Scenario>,
    phase: Phase,
    generation: u64,
    intro_spoken: bool,
    selected_choice_id: Option<String>,
    last_emotion: Option<EmotionSample>,
    feedback: Option<Feedback>,
    credited: bool,
    exit: Option<SessionExit>,
}

impl Playthrough {
    /// A fresh playthrough in the intro phase.
    #[must_use]
    pub fn new(scenario: Arc<Scenario>) -> Self {
        Self {
            scenario,
            phase: Phase::Intro,
            generation: 0,
            intro_spoken: false,
            selected_choice_id: None,
            last_emotion: None,
            feedback: None,
            credited: false,
            exit: None,
        }
    }

    /// Marks the intro as narrated. Returns `true` only the first time.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionEnded` after exit.
    pub fn begin(&mut self) -> Result<bool, EngineError> {
        self.ensure_active()?;
        if self.phase != Phase::Intro || self.intro_spoken {
            return Ok(false);
        }
        self.intro_spoken = true;
        Ok(true)
    }

    /// Moves from the intro to the choices. Returns the new generation.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the intro phase.
    pub fn advance(&mut self) -> Result<u64, EngineError> {
        self.require(Phase::Intro, "advance")?;
        Ok(self.enter(Phase::Choices))
    }

    /// Records a selection. The first valid selection in a visit to the
    /// choices stands; later calls are ignored.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the choices phase and
    /// `EngineError::InvalidChoice` for an unknown choice id.
    pub fn select(&mut self, choice_id: &str) -> Result<SelectOutcome, EngineError> {
        self.require(Phase::Choices, "select a choice")?;
        if self.selected_choice_id.is_some() {
            return Ok(SelectOutcome::AlreadySelected);
        }
        let choice = self
            .scenario
            .choice(choice_id)
            .cloned()
            .ok_or_else(|| EngineError::InvalidChoice {
                scenario_id: self.scenario.id.clone(),
                choice_id: choice_id.to_owned(),
            })?;
        self.selected_choice_id = Some(choice.id.clone());
        Ok(SelectOutcome::Accepted(choice))
    }

    /// Confirms the selection made under `generation` with the expression
    /// captured at this instant, and moves to the feedback phase.
    ///
    /// Returns `None` when the confirmation is stale: the session has left
    /// that visit to the choices, exited, or has nothing selected.
    pub fn confirm(
        &mut self,
        generation: u64,
        emotion: Option<EmotionSample>,
    ) -> Option<Feedback> {
        if !self.is_current(Phase::Choices, generation) {
            return None;
        }
        let choice = self.selected_choice()?;
        let feedback = FeedbackEngine::evaluate(choice.is_good, emotion.map(|s| s.emotion));
        self.last_emotion = emotion;
        self.feedback = Some(feedback.clone());
        self.enter(Phase::Feedback);
        Some(feedback)
    }

    /// Returns to the choices, clearing the selection and its feedback.
    /// Returns the new generation.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the feedback phase.
    pub fn retry(&mut self) -> Result<u64, EngineError> {
        self.require(Phase::Feedback, "retry")?;
        self.selected_choice_id = None;
        self.last_emotion = None;
        self.feedback = None;
        Ok(self.enter(Phase::Choices))
    }

    /// Enters the outcome phase, or re-enters it. Progress is credited on the
    /// first entry after a good choice and never again.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` unless in the feedback or
    /// outcome phase.
    pub fn enter_outcome(&mut self) -> Result<OutcomeEntry, EngineError> {
        self.ensure_active()?;
        let reentry = match self.phase {
            Phase::Feedback => false,
            Phase::Outcome => true,
            phase => {
                return Err(EngineError::InvalidTransition {
                    phase: phase.label(),
                    action: "continue to the outcome",
                });
            }
        };
        let choice_is_good = self.selected_choice().is_some_and(|c| c.is_good);
        if !reentry {
            self.enter(Phase::Outcome);
        }
        let credit = choice_is_good && !self.credited;
        self.credited |= credit;
        Ok(OutcomeEntry {
            choice_is_good,
            credit,
            reentry,
        })
    }

    /// Ends the session from the outcome phase.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the outcome phase.
    pub fn exit(&mut self, exit: SessionExit) -> Result<(), EngineError> {
        self.require(Phase::Outcome, "leave the scenario")?;
        self.exit = Some(exit);
        self.generation += 1;
        Ok(())
    }

    /// Ends the session from any phase. Returns `false` if it had already ended.
    pub fn abandon(&mut self) -> bool {
        if self.exit.is_some() {
            return false;
        }
        self.exit = Some(SessionExit::Abandoned);
        self.generation += 1;
        true
    }

    /// Whether a deferred action scheduled in `phase` under `generation` may
    /// still run.
    #[must_use]
    pub fn is_current(&self, phase: Phase, generation: u64) -> bool {
        self.exit.is_none() && self.phase == phase && self.generation == generation
    }

    /// The scenario being played.
    #[must_use]
    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn selected_choice_id(&self) -> Option<&str> {
        self.selected_choice_id.as_deref()
    }

    /// The selected choice, if any.
    #[must_use]
    pub fn selected_choice(&self) -> Option<&Choice> {
        self.selected_choice_id
            .as_deref()
            .and_then(|id| self.scenario.choice(id))
    }

    #[must_use]
    pub fn last_emotion(&self) -> Option<EmotionSample> {
        self.last_emotion
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Whether progress has been credited in this session.
    #[must_use]
    pub fn credited(&self) -> bool {
        self.credited
    }

    #[must_use]
    pub fn exit_reason(&self) -> Option<SessionExit> {
        self.exit
    }

    fn enter(&mut self, phase: Phase) -> u64 {
        self.phase = phase;
        self.generation += 1;
        self.generation
    }

    fn ensure_active(&self) -> Result<(), EngineError> {
        if self.exit.is_some() {
            Err(EngineError::SessionEnded)
        } else {
            Ok(())
        }
    }

    fn require(&self, phase: Phase, action: &'static str) -> Result<(), EngineError> {
        self.ensure_active()?;
        if self.phase == phase {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition {
                phase: self.phase.label(),
                action,
            })
        }
    }
}
