//! Application-level configuration loading: quiz pacing, record TTLs and socket settings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SPOTIQUIZ_BACK_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fixed timers driving the quiz orchestrator.
pub struct QuizTimings {
    /// Grace period after a start so clients can finish subscribing.
    pub warmup: Duration,
    /// How long players have to answer each question.
    pub answer_window: Duration,
    /// Pause after each interim scoreboard before the next question.
    pub intermission: Duration,
}

impl Default for QuizTimings {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            answer_window: Duration::from_secs(5),
            intermission: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Per-connection WebSocket settings.
pub struct SessionSettings {
    /// Capacity of each connection's outbound queue; a full queue drops the connection.
    pub outbound_capacity: usize,
    /// Fixed cadence at which the outbound pump pings the peer.
    pub ping_interval: Duration,
    /// A connection that neither sent a frame (pongs included) nor received a payload
    /// this long is closed.
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            ping_interval: Duration::from_secs(54),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Orchestrator delays.
    pub quiz: QuizTimings,
    /// WebSocket session limits.
    pub session: SessionSettings,
    /// TTL applied to every room-scoped record on each write.
    pub record_ttl: Duration,
    /// Points awarded for each correct answer.
    pub points_per_answer: u64,
    /// Upper bound on the number of questions generated for a game.
    pub max_questions: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        ttl_secs = app_config.record_ttl.as_secs(),
                        max_questions = app_config.max_questions,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            quiz: QuizTimings::default(),
            session: SessionSettings::default(),
            record_ttl: Duration::from_secs(60 * 60),
            points_per_answer: 1000,
            max_questions: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "snake_case")]
/// JSON representation of the configuration file; every field is optional.
struct RawConfig {
    warmup_ms: Option<u64>,
    answer_window_ms: Option<u64>,
    intermission_ms: Option<u64>,
    record_ttl_minutes: Option<u64>,
    points_per_answer: Option<u64>,
    max_questions: Option<usize>,
    outbound_capacity: Option<usize>,
    ping_interval_secs: Option<u64>,
    idle_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let quiz = QuizTimings {
            warmup: value
                .warmup_ms
                .map_or(defaults.quiz.warmup, Duration::from_millis),
            answer_window: value
                .answer_window_ms
                .map_or(defaults.quiz.answer_window, Duration::from_millis),
            intermission: value
                .intermission_ms
                .map_or(defaults.quiz.intermission, Duration::from_millis),
        };
        let session = SessionSettings {
            outbound_capacity: value
                .outbound_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.session.outbound_capacity),
            ping_interval: value
                .ping_interval_secs
                .map_or(defaults.session.ping_interval, Duration::from_secs),
            idle_timeout: value
                .idle_timeout_secs
                .map_or(defaults.session.idle_timeout, Duration::from_secs),
        };

        Self {
            quiz,
            session,
            record_ttl: value
                .record_ttl_minutes
                .map_or(defaults.record_ttl, |minutes| Duration::from_secs(minutes * 60)),
            points_per_answer: value.points_per_answer.unwrap_or(defaults.points_per_answer),
            max_questions: value.max_questions.unwrap_or(defaults.max_questions),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "answer_window_ms": 8000, "max_questions": 5 }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.quiz.answer_window, Duration::from_secs(8));
        assert_eq!(config.quiz.warmup, Duration::from_secs(2));
        assert_eq!(config.max_questions, 5);
        assert_eq!(config.points_per_answer, 1000);
        assert_eq!(config.session, SessionSettings::default());
    }

    #[test]
    fn zero_outbound_capacity_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{ "outbound_capacity": 0 }"#).unwrap();
        assert_eq!(AppConfig::from(raw).session.outbound_capacity, 256);
    }
}
