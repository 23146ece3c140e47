//! Host configuration, read from the environment.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use emostory_core::settings::AccessibilitySettings;
use emostory_scenario::EngineConfig;

use crate::error::AppError;

/// Where the child goes after the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitChoice {
    PlayAnother,
    Home,
}

/// Everything the host needs to play one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Scenario to play.
    pub scenario_id: String,
    /// Choice to select; the first good choice when unset.
    pub choice_id: Option<String>,
    /// When set, retry after the first feedback and select this choice.
    pub retry_choice_id: Option<String>,
    /// Exit taken after the outcome.
    pub exit: ExitChoice,
    /// Name of the profile created for the run.
    pub profile_name: String,
    /// Optional YAML catalog merged over the built-in scenarios.
    pub scenarios_file: Option<PathBuf>,
    /// Seed for the simulated affect device; entropy when unset.
    pub affect_seed: Option<u64>,
    pub settings: AccessibilitySettings,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a variable is present but malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = AccessibilitySettings::default();
        let engine_defaults = EngineConfig::default();

        let settings = AccessibilitySettings {
            speech_enabled: optional(&lookup, "EMOSTORY_SPEECH_ENABLED", parse_bool)?
                .unwrap_or(defaults.speech_enabled),
            narration_speed: optional(&lookup, "EMOSTORY_NARRATION_SPEED", parse_speed)?
                .unwrap_or(defaults.narration_speed),
            enhanced_narration_enabled: optional(&lookup, "EMOSTORY_ENHANCED_NARRATION", parse_bool)?
                .unwrap_or(defaults.enhanced_narration_enabled),
            affect_capture_enabled: optional(&lookup, "EMOSTORY_AFFECT_ENABLED", parse_bool)?
                .unwrap_or(defaults.affect_capture_enabled),
        };

        let engine = EngineConfig {
            settle_delay_ms: optional(&lookup, "EMOSTORY_SETTLE_MS", parse_number)?
                .unwrap_or(engine_defaults.settle_delay_ms),
            confirm_delay_ms: optional(&lookup, "EMOSTORY_CONFIRM_MS", parse_number)?
                .unwrap_or(engine_defaults.confirm_delay_ms),
        };

        let exit = match lookup("EMOSTORY_EXIT").as_deref().map(str::trim) {
            None | Some("" | "home") => ExitChoice::Home,
            Some("play_another" | "play-another") => ExitChoice::PlayAnother,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "EMOSTORY_EXIT must be home or play_another, got {other}"
                )));
            }
        };

        Ok(Self {
            scenario_id: non_blank(&lookup, "EMOSTORY_SCENARIO")
                .unwrap_or_else(|| "sharing-toy".to_string()),
            choice_id: non_blank(&lookup, "EMOSTORY_CHOICE"),
            retry_choice_id: non_blank(&lookup, "EMOSTORY_RETRY_CHOICE"),
            exit,
            profile_name: non_blank(&lookup, "EMOSTORY_PROFILE_NAME")
                .unwrap_or_else(|| "Explorer".to_string()),
            scenarios_file: non_blank(&lookup, "EMOSTORY_SCENARIOS_FILE").map(PathBuf::from),
            affect_seed: optional(&lookup, "EMOSTORY_AFFECT_SEED", parse_number)?,
            settings,
            engine,
        })
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str, &str) -> Result<T, AppError>,
) -> Result<Option<T>, AppError> {
    non_blank(lookup, name)
        .map(|value| parse(name, &value))
        .transpose()
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{name} must be a boolean, got {value}"
        ))),
    }
}

fn parse_number<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| AppError::Config(format!("{name} must be a valid number: {e}")))
}

fn parse_speed(name: &str, value: &str) -> Result<f32, AppError> {
    let speed: f32 = parse_number(name, value)?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(AppError::Config(format!("{name} must be positive, got {value}")))
    }
}
