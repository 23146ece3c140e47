//! The scenario engine.
//!
//! Wraps the pure [`Playthrough`] state machine with everything that happens
//! in time: phase timers, speech, affect capture and progress crediting.
//! Timers are spawned tasks raced against a per-phase cancellation token and
//! re-check the playthrough generation before acting, so a timer that fires
//! after its phase was left does nothing.
//!
//! The session lock is a `std::sync::Mutex` and is never held across an
//! `.await`; only progress crediting awaits, and it runs after the lock is
//! released.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use emostory_affect::{AffectLease, AffectSource};
use emostory_core::clock::SharedClock;
use emostory_core::emotion::EmotionSample;
use emostory_core::error::{CollaboratorError, EngineError};
use emostory_core::event::EventMetadata;
use emostory_core::profile::{ProfileStore, ProgressPatch};
use emostory_core::settings::AccessibilitySettingsSource;
use emostory_core::speech::UtterancePriority;
use emostory_feedback::{Feedback, FeedbackCategory};
use emostory_speech::{Emphasis, SpeakOptions, SpeechOrchestrator};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::catalog::ScenarioCatalog;
use crate::domain::events::{SessionEvent, SessionEventKind, SessionExit};
use crate::domain::narration;
use crate::domain::playthrough::{Phase, Playthrough, SelectOutcome};
use crate::domain::scenario::Scenario;

/// Phase timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between entering the choices and speaking the prompt.
    pub settle_delay_ms: u64,
    /// Delay between a selection and its confirmation.
    pub confirm_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            confirm_delay_ms: 1000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }
}

/// Collaborators injected into every session.
#[derive(Clone)]
pub struct EngineDeps {
    pub speech: SpeechOrchestrator,
    pub affect: AffectSource,
    pub profiles: Arc<dyn ProfileStore>,
    pub settings: Arc<dyn AccessibilitySettingsSource>,
    pub clock: SharedClock,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PlaythroughView {
    pub session_id: Uuid,
    pub scenario_id: String,
    pub profile_id: Option<Uuid>,
    pub phase: Phase,
    pub selected_choice_id: Option<String>,
    pub last_emotion: Option<EmotionSample>,
    pub feedback: Option<Feedback>,
    pub credited: bool,
    pub exit: Option<SessionExit>,
}

#[derive(Debug, Clone, Copy)]
enum PhaseTimer {
    Prompt { retry: bool },
    Confirm,
}

struct SessionState {
    playthrough: Playthrough,
    phase_cancel: CancellationToken,
    affect: Option<AffectLease>,
    journal: Vec<SessionEvent>,
}

struct Shared {
    session_id: Uuid,
    profile_id: Option<Uuid>,
    config: EngineConfig,
    deps: EngineDeps,
    state: Mutex<SessionState>,
}

/// One scenario playthrough.
///
/// Operations are synchronous except [`ScenarioEngine::continue_to_outcome`],
/// which may write to the profile store. Timers and speech need a Tokio
/// runtime. Dropping the engine ends the session.
pub struct ScenarioEngine {
    shared: Arc<Shared>,
}

impl fmt::Debug for ScenarioEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioEngine")
            .field("session_id", &self.shared.session_id)
            .field("profile_id", &self.shared.profile_id)
            .finish_non_exhaustive()
    }
}

impl ScenarioEngine {
    /// Opens a session for `scenario_id`, played by `profile_id`.
    ///
    /// The affect source is only claimed while the session is in the choices
    /// phase. If another session has it then, this one proceeds without
    /// emotion data.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ScenarioNotFound` if the catalog has no such
    /// scenario. Nothing is spoken in that case.
    pub fn start(
        scenario_id: &str,
        profile_id: Option<Uuid>,
        catalog: &dyn ScenarioCatalog,
        deps: EngineDeps,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let scenario = catalog.get_scenario(scenario_id).map_err(|lookup| {
            debug!(scenario_id, error = %lookup, "scenario lookup failed");
            let error = EngineError::ScenarioNotFound(scenario_id.to_owned());
            log_engine_error(None, &error);
            error
        })?;

        let session_id = Uuid::now_v7();

        let shared = Arc::new(Shared {
            session_id,
            profile_id,
            config,
            deps,
            state: Mutex::new(SessionState {
                playthrough: Playthrough::new(Arc::clone(&scenario)),
                phase_cancel: CancellationToken::new(),
                affect: None,
                journal: Vec::new(),
            }),
        });

        {
            let mut state = shared.lock();
            shared.record(
                &mut state,
                SessionEventKind::SessionStarted {
                    scenario_id: scenario.id.clone(),
                    profile_id,
                },
            );
        }

        info!(%session_id, scenario_id = %scenario.id, ?profile_id, "scenario session started");
        Ok(Self { shared })
    }

    /// Narrates the intro. Only the first call speaks.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionEnded` after exit.
    pub fn begin(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        if !shared.checked(state.playthrough.begin())? {
            debug!(session_id = %shared.session_id, "intro already narrated");
            return Ok(());
        }

        let enhanced = shared.deps.settings.snapshot().enhanced_narration_enabled;
        let text = narration::intro(state.playthrough.scenario(), enhanced);
        shared
            .deps
            .speech
            .speak_with_emphasis(&text, Emphasis::Encouraging);
        shared.record(&mut state, SessionEventKind::IntroNarrated);
        Ok(())
    }

    /// Leaves the intro for the choices.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the intro phase.
    pub fn advance(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        shared.checked(state.playthrough.advance())?;
        shared.enter_choices(&mut state, false);
        Ok(())
    }

    /// Selects a choice. The first valid selection stands until a retry.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidChoice` for an unknown id and
    /// `EngineError::InvalidTransition` outside the choices phase.
    pub fn select_choice(&self, choice_id: &str) -> Result<SelectOutcome, EngineError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        let outcome = shared.checked(state.playthrough.select(choice_id))?;

        match &outcome {
            SelectOutcome::AlreadySelected => {
                debug!(session_id = %shared.session_id, choice_id, "selection ignored");
            }
            SelectOutcome::Accepted(choice) => {
                info!(
                    session_id = %shared.session_id,
                    choice_id = %choice.id,
                    is_good = choice.is_good,
                    "choice selected"
                );
                shared
                    .deps
                    .speech
                    .speak(&narration::selection_echo(choice), SpeakOptions::default());
                shared.record(
                    &mut state,
                    SessionEventKind::ChoiceSelected {
                        choice_id: choice.id.clone(),
                    },
                );
                shared.schedule(&state, PhaseTimer::Confirm, shared.config.confirm_delay());
            }
        }
        Ok(outcome)
    }

    /// Returns from the feedback to the choices.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the feedback phase.
    pub fn retry(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        shared.checked(state.playthrough.retry())?;
        shared.enter_choices(&mut state, true);
        Ok(())
    }

    /// Shows the outcome. Re-entering re-speaks the outcome without crediting
    /// again. Profile store failures are logged, never returned.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` unless in the feedback or
    /// outcome phase.
    pub async fn continue_to_outcome(&self) -> Result<(), EngineError> {
        let shared = &self.shared;
        let entry = {
            let mut state = shared.lock();
            let entry = shared.checked(state.playthrough.enter_outcome())?;
            if !entry.reentry {
                shared.on_phase_entered(&mut state);
            }
            let emphasis = if entry.choice_is_good {
                Emphasis::Excited
            } else {
                Emphasis::Calm
            };
            shared
                .deps
                .speech
                .speak_with_emphasis(narration::outcome(entry.choice_is_good), emphasis);
            shared.record(
                &mut state,
                SessionEventKind::OutcomeNarrated {
                    choice_is_good: entry.choice_is_good,
                },
            );
            entry
        };

        if entry.credit {
            shared.credit_progress().await;
        }
        Ok(())
    }

    /// Leaves for another scenario and ends the session.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the outcome phase.
    pub fn play_another(&self) -> Result<SessionExit, EngineError> {
        self.leave(SessionExit::PlayAnother, narration::PLAY_ANOTHER)
    }

    /// Leaves for the profile screen and ends the session.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidTransition` outside the outcome phase.
    pub fn go_home(&self) -> Result<SessionExit, EngineError> {
        self.leave(SessionExit::Home, narration::GO_HOME)
    }

    /// Ends the session from any phase: cancels timers, stops speech and
    /// releases the affect source. Idempotent.
    pub fn end(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();
        if !state.playthrough.abandon() {
            return;
        }
        state.phase_cancel.cancel();
        shared.release_affect(&mut state);
        shared.deps.speech.stop();
        shared.record(
            &mut state,
            SessionEventKind::SessionExited {
                exit: SessionExit::Abandoned,
            },
        );
        info!(session_id = %shared.session_id, "scenario session abandoned");
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> PlaythroughView {
        let shared = &self.shared;
        let state = shared.lock();
        let playthrough = &state.playthrough;
        PlaythroughView {
            session_id: shared.session_id,
            scenario_id: playthrough.scenario().id.clone(),
            profile_id: shared.profile_id,
            phase: playthrough.phase(),
            selected_choice_id: playthrough.selected_choice_id().map(str::to_owned),
            last_emotion: playthrough.last_emotion(),
            feedback: playthrough.feedback().cloned(),
            credited: playthrough.credited(),
            exit: playthrough.exit_reason(),
        }
    }

    /// The session journal, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.shared.lock().journal.clone()
    }

    /// The scenario being played.
    #[must_use]
    pub fn scenario(&self) -> Arc<Scenario> {
        Arc::clone(self.shared.lock().playthrough.scenario())
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().playthrough.phase()
    }

    fn leave(&self, exit: SessionExit, farewell: &str) -> Result<SessionExit, EngineError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        shared.checked(state.playthrough.exit(exit))?;
        state.phase_cancel.cancel();
        shared.release_affect(&mut state);
        shared
            .deps
            .speech
            .speak_with_emphasis(farewell, Emphasis::Encouraging);
        shared.record(&mut state, SessionEventKind::SessionExited { exit });
        info!(session_id = %shared.session_id, exit = exit.label(), "scenario session exited");
        Ok(exit)
    }
}

fn log_engine_error(session_id: Option<Uuid>, error: &EngineError) {
    if error.is_recoverable() {
        warn!(?session_id, %error, "operation rejected");
    } else {
        error!(?session_id, %error, "session cannot continue");
    }
}

impl Drop for ScenarioEngine {
    fn drop(&mut self) {
        self.end();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked<T>(&self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        result.inspect_err(|error| log_engine_error(Some(self.session_id), error))
    }

    fn record(&self, state: &mut SessionState, kind: SessionEventKind) {
        let sequence_number = state.journal.len() as u64 + 1;
        let event_type = kind.event_type();
        debug!(session_id = %self.session_id, event_type, sequence_number, "session event");
        state.journal.push(SessionEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: event_type.to_owned(),
                session_id: self.session_id,
                sequence_number,
                occurred_at: self.deps.clock.now(),
            },
            kind,
        });
    }

    fn on_phase_entered(&self, state: &mut SessionState) {
        state.phase_cancel.cancel();
        state.phase_cancel = CancellationToken::new();
        self.deps.speech.stop();
        let phase = state.playthrough.phase();
        info!(session_id = %self.session_id, phase = phase.label(), "phase entered");
        self.record(state, SessionEventKind::PhaseEntered { phase });
    }

    fn enter_choices(self: &Arc<Self>, state: &mut SessionState, retry: bool) {
        self.on_phase_entered(state);
        self.arm_affect(state);
        self.schedule(state, PhaseTimer::Prompt { retry }, self.config.settle_delay());
    }

    fn arm_affect(&self, state: &mut SessionState) {
        if !self.deps.settings.snapshot().affect_capture_enabled {
            debug!(session_id = %self.session_id, "affect capture disabled by settings");
            return;
        }
        if state.affect.is_none() {
            match self.deps.affect.lease(self.session_id) {
                Ok(lease) => state.affect = Some(lease),
                Err(error) => {
                    warn!(session_id = %self.session_id, %error, "continuing without emotion data");
                    self.record(
                        state,
                        SessionEventKind::AffectUnavailable {
                            reason: error.to_string(),
                        },
                    );
                    return;
                }
            }
        }
        let Some(lease) = state.affect.as_ref() else {
            return;
        };
        match lease.start() {
            Ok(()) => self.record(state, SessionEventKind::AffectArmed),
            Err(error) => {
                self.record(
                    state,
                    SessionEventKind::AffectUnavailable {
                        reason: error.to_string(),
                    },
                );
                state.affect = None;
            }
        }
    }

    fn disarm_affect(&self, state: &mut SessionState) {
        let Some(lease) = state.affect.as_ref() else {
            return;
        };
        if !lease.is_armed() {
            return;
        }
        lease.stop();
        self.record(state, SessionEventKind::AffectDisarmed);
    }

    fn release_affect(&self, state: &mut SessionState) {
        self.disarm_affect(state);
        state.affect = None;
    }

    fn schedule(self: &Arc<Self>, state: &SessionState, timer: PhaseTimer, delay: Duration) {
        let generation = state.playthrough.generation();
        let cancel = state.phase_cancel.clone();
        let Ok(runtime) = Handle::try_current() else {
            warn!(session_id = %self.session_id, ?timer, "no async runtime; phase timer dropped");
            return;
        };

        let shared = Arc::clone(self);
        runtime.spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(session_id = %shared.session_id, ?timer, "phase timer cancelled");
                }
                () = tokio::time::sleep(delay) => shared.fire(timer, generation),
            }
        });
    }

    fn fire(&self, timer: PhaseTimer, generation: u64) {
        let mut state = self.lock();
        match timer {
            PhaseTimer::Prompt { retry } => self.issue_prompt(&mut state, generation, retry),
            PhaseTimer::Confirm => self.confirm_choice(&mut state, generation),
        }
    }

    fn issue_prompt(&self, state: &mut SessionState, generation: u64, retry: bool) {
        if !state.playthrough.is_current(Phase::Choices, generation) {
            debug!(session_id = %self.session_id, "stale prompt timer dropped");
            return;
        }
        if state.playthrough.selected_choice_id().is_some() {
            debug!(session_id = %self.session_id, "choice already made; prompt skipped");
            return;
        }
        let text = if retry {
            narration::RETRY_PROMPT
        } else {
            narration::CHOICES_PROMPT
        };
        self.deps
            .speech
            .speak_with_emphasis(text, Emphasis::Encouraging);
        self.record(state, SessionEventKind::PromptIssued { retry });
    }

    fn confirm_choice(&self, state: &mut SessionState, generation: u64) {
        let sample = state.affect.as_ref().and_then(AffectLease::latest_sample);
        let Some(feedback) = state.playthrough.confirm(generation, sample) else {
            debug!(session_id = %self.session_id, "stale confirmation dropped");
            return;
        };

        let choice_id = state
            .playthrough
            .selected_choice_id()
            .unwrap_or_default()
            .to_owned();
        self.record(
            state,
            SessionEventKind::ChoiceConfirmed {
                choice_id,
                emotion: sample,
            },
        );
        self.release_affect(state);
        self.on_phase_entered(state);

        info!(
            session_id = %self.session_id,
            category = feedback.category.label(),
            emotion = ?sample.map(|s| s.emotion),
            "feedback given"
        );
        let emphasis = match feedback.category {
            FeedbackCategory::Positive => Emphasis::Excited,
            FeedbackCategory::Neutral | FeedbackCategory::Negative => Emphasis::Encouraging,
        };
        self.deps.speech.speak(
            &feedback.message,
            emphasis.options().with_priority(UtterancePriority::High),
        );
        self.record(
            state,
            SessionEventKind::FeedbackGiven {
                category: feedback.category,
            },
        );
    }

    async fn credit_progress(&self) {
        let Some(profile_id) = self.profile_id else {
            debug!(session_id = %self.session_id, "no active profile; progress not credited");
            return;
        };

        match self.apply_credit(profile_id).await {
            Ok(scenarios_completed) => {
                info!(
                    session_id = %self.session_id,
                    %profile_id,
                    scenarios_completed,
                    "progress credited"
                );
                let mut state = self.lock();
                self.record(
                    &mut state,
                    SessionEventKind::ProgressCredited {
                        profile_id,
                        scenarios_completed,
                    },
                );
            }
            Err(error) => {
                warn!(session_id = %self.session_id, %profile_id, %error, "failed to credit progress");
                let mut state = self.lock();
                self.record(
                    &mut state,
                    SessionEventKind::ProgressCreditFailed {
                        profile_id,
                        reason: error.to_string(),
                    },
                );
            }
        }
    }

    async fn apply_credit(&self, profile_id: Uuid) -> Result<u32, CollaboratorError> {
        let profile = self.deps.profiles.get_profile(profile_id).await?;
        let patch = ProgressPatch::credit_completion(&profile);
        self.deps.profiles.apply_patch(profile_id, patch).await?;
        Ok(patch
            .scenarios_completed
            .unwrap_or(profile.scenarios_completed))
    }
}

#[cfg(test)]
mod tests {
    use emostory_core::affect::AffectDevice;
    use emostory_core::emotion::Emotion;
    use emostory_core::profile::Profile;
    use emostory_core::settings::{AccessibilitySettings, SharedSettings};
    use emostory_test_support::{
        FailingProfileStore, FixedClock, RecordingProfileStore, RecordingSpeechBackend,
        ScriptedAffectDevice, UnavailableAffectDevice, fixed_now, sample_profile,
    };

    use super::*;
    use crate::application::catalog::InMemoryCatalog;

    struct Fixture {
        speech: Arc<RecordingSpeechBackend>,
        profiles: Arc<RecordingProfileStore>,
        profile: Profile,
        settings: SharedSettings,
        deps: EngineDeps,
    }

    impl Fixture {
        fn new(device: Arc<dyn AffectDevice>) -> Self {
            let speech = Arc::new(RecordingSpeechBackend::new());
            let profile = sample_profile(3);
            let profiles = Arc::new(RecordingProfileStore::with_profile(profile.clone()));
            let settings = SharedSettings::new(AccessibilitySettings::default());
            let settings_source: Arc<dyn AccessibilitySettingsSource> = Arc::new(settings.clone());
            let deps = EngineDeps {
                speech: SpeechOrchestrator::new(speech.clone(), Arc::clone(&settings_source)),
                affect: AffectSource::new(device),
                profiles: profiles.clone(),
                settings: settings_source,
                clock: Arc::new(FixedClock(fixed_now())),
            };
            Self {
                speech,
                profiles,
                profile,
                settings,
                deps,
            }
        }

        fn with_emotion(emotion: Emotion) -> (Self, Arc<ScriptedAffectDevice>) {
            let device = Arc::new(ScriptedAffectDevice::new(Some(EmotionSample::new(
                emotion, 0.9,
            ))));
            (Self::new(device.clone()), device)
        }

        fn start(&self, scenario_id: &str) -> ScenarioEngine {
            ScenarioEngine::start(
                scenario_id,
                Some(self.profile.id),
                &InMemoryCatalog::built_in(),
                self.deps.clone(),
                EngineConfig::default(),
            )
            .unwrap()
        }

        fn spoken(&self, text: &str) -> usize {
            self.speech
                .spoken_texts()
                .iter()
                .filter(|t| t.as_str() == text)
                .count()
        }
    }

    async fn settle(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    async fn reach_feedback(engine: &ScenarioEngine, choice_id: &str) {
        engine.begin().unwrap();
        engine.advance().unwrap();
        settle(600).await;
        engine.select_choice(choice_id).unwrap();
        settle(1100).await;
    }

    fn kinds(engine: &ScenarioEngine) -> Vec<SessionEventKind> {
        engine.events().into_iter().map(|e| e.kind).collect()
    }

    fn position(kinds: &[SessionEventKind], wanted: &SessionEventKind) -> usize {
        kinds.iter().position(|k| k == wanted).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_narrates_intro_once() {
        // Arrange
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");

        // Act
        engine.begin().unwrap();
        engine.begin().unwrap();
        engine.begin().unwrap();
        settle(10).await;

        // Assert
        let spoken = fixture.speech.spoken_texts();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].starts_with("Starting The Toy Tug-of-War."));
        assert!(spoken[0].contains("Both Alex and Jamie want to play with the red car"));
        let intros = kinds(&engine)
            .into_iter()
            .filter(|k| *k == SessionEventKind::IntroNarrated)
            .count();
        assert_eq!(intros, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enhanced_narration_extends_the_single_intro() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        fixture
            .settings
            .update(|s| s.enhanced_narration_enabled = true);
        let engine = fixture.start("sharing-toy");

        engine.begin().unwrap();
        settle(10).await;

        let spoken = fixture.speech.spoken_texts();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].contains("Interactive scenario: The Toy Tug-of-War."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_affect_is_armed_before_the_prompt() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.begin().unwrap();

        // Act
        engine.advance().unwrap();
        settle(600).await;

        // Assert
        let kinds = kinds(&engine);
        let armed = position(&kinds, &SessionEventKind::AffectArmed);
        let prompt = position(&kinds, &SessionEventKind::PromptIssued { retry: false });
        assert!(armed < prompt);
        assert!(device.is_armed());
        assert_eq!(fixture.spoken(narration::CHOICES_PROMPT), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_waits_for_the_settle_delay() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");

        engine.advance().unwrap();
        settle(400).await;
        assert_eq!(fixture.spoken(narration::CHOICES_PROMPT), 0);

        settle(200).await;
        assert_eq!(fixture.spoken(narration::CHOICES_PROMPT), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expression_is_captured_at_confirmation_time() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Neutral);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();
        settle(600).await;

        // Act
        engine.select_choice("share").unwrap();
        settle(500).await;
        device.set_sample(Some(EmotionSample::new(Emotion::Happy, 0.8)));
        settle(600).await;

        // Assert
        let view = engine.snapshot();
        assert_eq!(view.phase, Phase::Feedback);
        assert_eq!(view.last_emotion.map(|s| s.emotion), Some(Emotion::Happy));
        let feedback = view.feedback.unwrap();
        assert_eq!(feedback.category, FeedbackCategory::Positive);
        assert_eq!(fixture.spoken(&feedback.message), 1);
        assert!(!device.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_echoes_choice_before_confirmation() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();
        settle(600).await;

        engine.select_choice("share").unwrap();
        settle(500).await;

        assert_eq!(fixture.spoken("You chose: Say 'Let's take turns!'"), 1);
        assert_eq!(engine.phase(), Phase::Choices);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_selection_is_ignored() {
        // Arrange
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();
        settle(600).await;

        // Act
        let first = engine.select_choice("share").unwrap();
        let second = engine.select_choice("grab").unwrap();
        settle(1100).await;

        // Assert
        assert!(matches!(first, SelectOutcome::Accepted(_)));
        assert_eq!(second, SelectOutcome::AlreadySelected);
        assert_eq!(engine.snapshot().selected_choice_id.as_deref(), Some("share"));
        assert_eq!(fixture.spoken("You chose: Grab the toy first"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_choice_is_rejected_without_state_change() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();

        let result = engine.select_choice("does-not-exist");

        assert_eq!(
            result,
            Err(EngineError::InvalidChoice {
                scenario_id: "sharing-toy".to_owned(),
                choice_id: "does-not-exist".to_owned(),
            })
        );
        assert!(engine.snapshot().selected_choice_id.is_none());
        assert!(matches!(
            engine.select_choice("share"),
            Ok(SelectOutcome::Accepted(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_during_intro_is_an_invalid_transition() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");

        let result = engine.select_choice("share");

        assert!(matches!(
            result,
            Err(EngineError::InvalidTransition { phase: "intro", .. })
        ));
        assert_eq!(engine.phase(), Phase::Intro);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_before_settle_skips_the_prompt() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");

        engine.advance().unwrap();
        settle(100).await;
        engine.select_choice("share").unwrap();
        settle(1500).await;

        assert_eq!(fixture.spoken(narration::CHOICES_PROMPT), 0);
        assert_eq!(engine.phase(), Phase::Feedback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ending_before_confirmation_drops_the_timer() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();
        settle(600).await;
        engine.select_choice("share").unwrap();

        // Act
        engine.end();
        settle(1500).await;

        // Assert
        let view = engine.snapshot();
        assert_eq!(view.phase, Phase::Choices);
        assert!(view.feedback.is_none());
        assert_eq!(view.exit, Some(SessionExit::Abandoned));
        assert!(!device.is_armed());
        assert!(fixture.deps.affect.holder().is_none());
        assert!(
            !kinds(&engine)
                .iter()
                .any(|k| matches!(k, SessionEventKind::FeedbackGiven { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_rearms_affect_and_speaks_retry_prompt() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Frustrated);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "grab").await;
        assert_eq!(device.arm_count(), 1);

        // Act
        engine.retry().unwrap();
        settle(600).await;

        // Assert
        assert_eq!(device.arm_count(), 2);
        assert!(device.is_armed());
        assert_eq!(fixture.spoken(narration::RETRY_PROMPT), 1);
        let view = engine.snapshot();
        assert_eq!(view.phase, Phase::Choices);
        assert!(view.selected_choice_id.is_none());
        assert!(view.last_emotion.is_none());
        assert!(view.feedback.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_good_outcome_credits_exactly_once() {
        // Arrange
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "share").await;

        // Act
        engine.continue_to_outcome().await.unwrap();
        settle(10).await;
        engine.continue_to_outcome().await.unwrap();
        settle(10).await;

        // Assert
        let patches = fixture.profiles.applied_patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.scenarios_completed, Some(4));
        assert_eq!(
            fixture
                .profiles
                .profile(fixture.profile.id)
                .map(|p| p.scenarios_completed),
            Some(4)
        );
        assert_eq!(fixture.spoken(narration::SUCCESS_OUTCOME), 2);
        assert!(engine.snapshot().credited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poor_outcome_encourages_without_credit() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Frustrated);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "grab").await;

        engine.continue_to_outcome().await.unwrap();
        settle(10).await;

        assert!(fixture.profiles.applied_patches().is_empty());
        assert_eq!(fixture.spoken(narration::ENCOURAGING_OUTCOME), 1);
        assert!(!engine.snapshot().credited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_profile_store_failure_is_logged_not_returned() {
        // Arrange
        let (mut fixture, _) = Fixture::with_emotion(Emotion::Happy);
        fixture.deps = EngineDeps {
            profiles: Arc::new(FailingProfileStore),
            ..fixture.deps.clone()
        };
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "share").await;

        // Act
        let result = engine.continue_to_outcome().await;

        // Assert
        assert_eq!(result, Ok(()));
        assert!(
            kinds(&engine)
                .iter()
                .any(|k| matches!(k, SessionEventKind::ProgressCreditFailed { .. }))
        );
        assert_eq!(engine.phase(), Phase::Outcome);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_active_profile_means_no_credit() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = ScenarioEngine::start(
            "sharing-toy",
            None,
            &InMemoryCatalog::built_in(),
            fixture.deps.clone(),
            EngineConfig::default(),
        )
        .unwrap();
        reach_feedback(&engine, "share").await;

        engine.continue_to_outcome().await.unwrap();

        assert!(fixture.profiles.applied_patches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_affect_device_yields_no_emotion() {
        // Arrange
        let fixture = Fixture::new(Arc::new(UnavailableAffectDevice));
        let engine = fixture.start("sharing-toy");

        // Act
        reach_feedback(&engine, "share").await;

        // Assert
        let view = engine.snapshot();
        assert!(view.last_emotion.is_none());
        assert_eq!(
            view.feedback.map(|f| f.message),
            Some("That was a good choice! I'm watching for your expression!".to_owned())
        );
        assert!(
            kinds(&engine)
                .iter()
                .any(|k| matches!(k, SessionEventKind::AffectUnavailable { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_affect_capture_never_arms_the_device() {
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        fixture.settings.update(|s| s.affect_capture_enabled = false);
        let engine = fixture.start("sharing-toy");

        reach_feedback(&engine, "share").await;

        assert_eq!(device.arm_count(), 0);
        assert!(engine.snapshot().last_emotion.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_speech_does_not_block_progression() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        fixture.settings.update(|s| s.speech_enabled = false);
        let engine = fixture.start("sharing-toy");

        reach_feedback(&engine, "share").await;
        engine.continue_to_outcome().await.unwrap();

        assert!(fixture.speech.spoken_texts().is_empty());
        assert_eq!(engine.phase(), Phase::Outcome);
        assert_eq!(fixture.profiles.applied_patches().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_affect_source_passes_to_the_next_session_once_released() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let first = fixture.start("sharing-toy");
        first.advance().unwrap();
        settle(600).await;
        let second = fixture.start("feeling-frustrated");
        reach_feedback(&second, "give-up").await;
        assert!(
            kinds(&second)
                .iter()
                .any(|k| matches!(k, SessionEventKind::AffectUnavailable { .. }))
        );
        assert!(second.snapshot().last_emotion.is_none());
        assert_eq!(fixture.deps.affect.holder(), Some(first.session_id()));

        // Act
        drop(first);
        second.retry().unwrap();
        settle(600).await;
        let holder_in_choices = fixture.deps.affect.holder();
        second.select_choice("keep-trying").unwrap();
        settle(1100).await;

        // Assert
        assert_eq!(holder_in_choices, Some(second.session_id()));
        assert_eq!(device.arm_count(), 2);
        assert_eq!(
            second.snapshot().last_emotion.map(|s| s.emotion),
            Some(Emotion::Happy)
        );
        assert!(fixture.deps.affect.holder().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_started_before_the_previous_one_ends_gets_affect() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let previous = fixture.start("sharing-toy");
        let next = fixture.start("feeling-frustrated");

        // Act
        drop(previous);
        reach_feedback(&next, "keep-trying").await;

        // Assert
        assert_eq!(device.arm_count(), 1);
        assert_eq!(
            next.snapshot().last_emotion.map(|s| s.emotion),
            Some(Emotion::Happy)
        );
        assert!(
            !kinds(&next)
                .iter()
                .any(|k| matches!(k, SessionEventKind::AffectUnavailable { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_in_outcome_does_not_block_arming() {
        // Arrange
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let idle = fixture.start("sharing-toy");
        reach_feedback(&idle, "share").await;
        idle.continue_to_outcome().await.unwrap();
        assert!(fixture.deps.affect.holder().is_none());
        let arms_before = device.arm_count();

        // Act
        let active = fixture.start("feeling-frustrated");
        reach_feedback(&active, "keep-trying").await;

        // Assert
        assert_eq!(idle.phase(), Phase::Outcome);
        assert_eq!(device.arm_count(), arms_before + 1);
        assert_eq!(
            active.snapshot().last_emotion.map(|s| s.emotion),
            Some(Emotion::Happy)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_affect_source_is_released_when_feedback_begins() {
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");

        assert!(fixture.deps.affect.holder().is_none());
        reach_feedback(&engine, "share").await;

        assert!(!device.is_armed());
        assert!(fixture.deps.affect.holder().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_scenario_fails_before_any_speech() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);

        let result = ScenarioEngine::start(
            "does-not-exist",
            Some(fixture.profile.id),
            &InMemoryCatalog::built_in(),
            fixture.deps.clone(),
            EngineConfig::default(),
        );
        settle(10).await;

        assert_eq!(
            result.unwrap_err(),
            EngineError::ScenarioNotFound("does-not-exist".to_owned())
        );
        assert!(fixture.speech.spoken_texts().is_empty());
        assert!(fixture.deps.affect.holder().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_another_ends_the_session() {
        // Arrange
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "share").await;
        engine.continue_to_outcome().await.unwrap();

        // Act
        let exit = engine.play_another().unwrap();
        settle(10).await;

        // Assert
        assert_eq!(exit, SessionExit::PlayAnother);
        assert_eq!(fixture.spoken(narration::PLAY_ANOTHER), 1);
        assert_eq!(engine.snapshot().exit, Some(SessionExit::PlayAnother));
        assert!(fixture.deps.affect.holder().is_none());
        assert_eq!(engine.begin(), Err(EngineError::SessionEnded));
        assert_eq!(engine.go_home(), Err(EngineError::SessionEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_home_is_rejected_before_the_outcome() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "share").await;

        let result = engine.go_home();

        assert!(matches!(
            result,
            Err(EngineError::InvalidTransition {
                phase: "feedback",
                ..
            })
        ));
        assert!(engine.snapshot().exit.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_journal_is_ordered_and_scoped_to_the_session() {
        let (fixture, _) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        reach_feedback(&engine, "share").await;

        let events = engine.events();

        assert!(matches!(
            events[0].kind,
            SessionEventKind::SessionStarted { .. }
        ));
        for (index, event) in events.iter().enumerate() {
            assert_eq!(event.metadata.sequence_number, index as u64 + 1);
            assert_eq!(event.metadata.session_id, engine.session_id());
            assert_eq!(event.metadata.occurred_at, fixed_now());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_engine_stops_speech_and_releases_affect() {
        let (fixture, device) = Fixture::with_emotion(Emotion::Happy);
        let engine = fixture.start("sharing-toy");
        engine.advance().unwrap();
        settle(600).await;
        let cancels_before = fixture.speech.cancel_count();

        drop(engine);
        settle(10).await;

        assert!(!device.is_armed());
        assert!(fixture.deps.affect.holder().is_none());
        assert!(fixture.speech.cancel_count() > cancels_before);
    }

    #[test]
    fn test_config_defaults_and_partial_deserialization() {
        let config: EngineConfig = serde_json::from_str(r#"{ "settle_delay_ms": 50 }"#).unwrap();

        assert_eq!(config.settle_delay(), Duration::from_millis(50));
        assert_eq!(config.confirm_delay(), Duration::from_millis(1000));
        assert_eq!(EngineConfig::default().settle_delay_ms, 500);
    }
}
