//! Plays one scenario from intro to exit the way a child would click through it.

use std::time::Duration;

use emostory_core::event::SessionEventEnvelope;
use emostory_scenario::{Phase, PlaythroughView, ScenarioEngine};
use emostory_speech::SpeechOrchestrator;
use serde::Serialize;
use tracing::info;

use crate::config::{AppConfig, ExitChoice};
use crate::error::AppError;
use crate::state::AppState;

/// Summary of a finished playthrough.
#[derive(Debug, Clone, Serialize)]
pub struct PlaythroughReport {
    /// Final session state.
    pub playthrough: PlaythroughView,
    /// The profile's completion count after the session.
    pub scenarios_completed: u32,
    /// Journal payloads, oldest first.
    pub events: Vec<serde_json::Value>,
}

/// Extra time allowed beyond a phase timer before giving up on it.
const PHASE_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Plays the configured scenario for a freshly created profile.
///
/// # Errors
///
/// Returns `AppError::Engine` if the scenario or a choice is unknown, and
/// `AppError::Timeout` if a phase timer never completes.
pub async fn run_playthrough(
    state: &AppState,
    config: &AppConfig,
) -> Result<PlaythroughReport, AppError> {
    let profile = state.profiles.create(&config.profile_name);
    let engine = ScenarioEngine::start(
        &config.scenario_id,
        Some(profile.id),
        &state.catalog,
        state.deps.clone(),
        state.engine,
    )?;
    let speech = &state.deps.speech;
    if let Err(error) = speech.availability() {
        info!(%error, "playing without narration");
    }

    engine.begin()?;
    wait_for_silence(speech).await;

    engine.advance()?;
    tokio::time::sleep(state.engine.settle_delay() + POLL_INTERVAL).await;
    wait_for_silence(speech).await;

    let first_choice = match &config.choice_id {
        Some(choice_id) => choice_id.clone(),
        None => first_good_choice(&engine)?,
    };
    choose(&engine, state, &first_choice).await?;

    if let Some(retry_choice) = &config.retry_choice_id {
        wait_for_silence(speech).await;
        engine.retry()?;
        tokio::time::sleep(state.engine.settle_delay() + POLL_INTERVAL).await;
        wait_for_silence(speech).await;
        choose(&engine, state, retry_choice).await?;
    }

    wait_for_silence(speech).await;
    engine.continue_to_outcome().await?;
    wait_for_silence(speech).await;

    let exit = match config.exit {
        ExitChoice::PlayAnother => engine.play_another()?,
        ExitChoice::Home => engine.go_home()?,
    };
    wait_for_silence(speech).await;
    info!(session_id = %engine.session_id(), exit = exit.label(), "playthrough finished");

    let scenarios_completed = state
        .profiles
        .find(profile.id)
        .map_or(profile.scenarios_completed, |p| p.scenarios_completed);
    let events = engine
        .events()
        .iter()
        .map(SessionEventEnvelope::to_payload)
        .collect();

    Ok(PlaythroughReport {
        playthrough: engine.snapshot(),
        scenarios_completed,
        events,
    })
}

async fn choose(
    engine: &ScenarioEngine,
    state: &AppState,
    choice_id: &str,
) -> Result<(), AppError> {
    engine.select_choice(choice_id)?;
    let deadline = state.engine.confirm_delay() + PHASE_GRACE;
    tokio::time::timeout(deadline, async {
        while engine.phase() != Phase::Feedback {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| AppError::Timeout("choice confirmation"))
}

fn first_good_choice(engine: &ScenarioEngine) -> Result<String, AppError> {
    engine
        .scenario()
        .choices
        .iter()
        .find(|c| c.is_good)
        .map(|c| c.id.clone())
        .ok_or_else(|| {
            AppError::Config("scenario has no good choice; set EMOSTORY_CHOICE".to_string())
        })
}

async fn wait_for_silence(speech: &SpeechOrchestrator) {
    let mut speaking = speech.subscribe();
    // Errs only once the orchestrator is gone.
    let _ = speaking.wait_for(|speaking| !*speaking).await;
}
