//! Application-level configuration loading: countdown seed and transport timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MILLIONAIRE_CONFIG_PATH";

const DEFAULT_QUESTION_TIME_LIMIT_SECS: u32 = 30;
const DEFAULT_SSE_KEEP_ALIVE_SECS: u64 = 15;
const DEFAULT_TRANSITION_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    question_time_limit_secs: u32,
    sse_keep_alive: Duration,
    transition_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), ?config, "loaded configuration");
                    config
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

    /// Parse a JSON document, using defaults for every missing field.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Seconds a contestant gets per question; seeds client countdowns.
    pub fn question_time_limit_secs(&self) -> u32 {
        self.question_time_limit_secs
    }

    /// Interval between SSE keep-alive comments.
    pub fn sse_keep_alive(&self) -> Duration {
        self.sse_keep_alive
    }

    /// Bound on the wait for the transition gate and on each storage call.
    pub fn transition_timeout(&self) -> Duration {
        self.transition_timeout
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            question_time_limit_secs: DEFAULT_QUESTION_TIME_LIMIT_SECS,
            sse_keep_alive: Duration::from_secs(DEFAULT_SSE_KEEP_ALIVE_SECS),
            transition_timeout: Duration::from_secs(DEFAULT_TRANSITION_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    question_time_limit_secs: Option<u32>,
    sse_keep_alive_secs: Option<u64>,
    transition_timeout_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            question_time_limit_secs: value
                .question_time_limit_secs
                .unwrap_or(DEFAULT_QUESTION_TIME_LIMIT_SECS),
            sse_keep_alive: Duration::from_secs(
                value
                    .sse_keep_alive_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SSE_KEEP_ALIVE_SECS),
            ),
            transition_timeout: Duration::from_secs(
                value
                    .transition_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TRANSITION_TIMEOUT_SECS),
            ),
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
    fn missing_fields_fall_back_to_defaults() {
        let config = AppConfig::from_json(r#"{"questionTimeLimitSecs": 45}"#).unwrap();
        assert_eq!(config.question_time_limit_secs(), 45);
        assert_eq!(config.sse_keep_alive(), Duration::from_secs(15));
        assert_eq!(config.transition_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_durations_are_ignored() {
        let config =
            AppConfig::from_json(r#"{"sseKeepAliveSecs": 0, "transitionTimeoutSecs": 0}"#).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(AppConfig::from_json(r#"{"questionTimeLimitSecs": "soon"}"#).is_err());
    }
}
