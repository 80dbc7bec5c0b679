//! Application-level configuration loading, including default phase durations.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::state::phase::PhaseName;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STAGECAST_BACK_CONFIG_PATH";
/// Environment variable carrying the operator bearer token.
const OPERATOR_TOKEN_ENV: &str = "OPERATOR_TOKEN";

/// Built-in phase durations used when an event does not override them.
const DEFAULT_PHASE_MINUTES: [(PhaseName, u32); 5] = [
    (PhaseName::Countdown, 15),
    (PhaseName::Welcome, 5),
    (PhaseName::Voting, 10),
    (PhaseName::Winner, 5),
    (PhaseName::ThankYou, 5),
];

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Default selection capacity for newly created events.
    pub default_capacity: usize,
    /// Default per-phase durations in minutes for newly created events.
    pub default_phase_minutes: IndexMap<PhaseName, u32>,
    /// Upper bound on phases entered by a single reconciliation sweep.
    pub reconcile_max_steps: usize,
    /// Seconds a viewer heartbeat counts towards the audience figure.
    pub presence_ttl_secs: u64,
    /// Bearer token required on operator routes, when configured.
    pub operator_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    ///
    /// The operator token always comes from the environment so it never lands
    /// in a config file on disk.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from config file");
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
        };

        config.operator_token = env::var(OPERATOR_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());
        if config.operator_token.is_none() {
            warn!("{OPERATOR_TOKEN_ENV} not set; operator routes are unauthenticated");
        }
        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_capacity: 5,
            default_phase_minutes: IndexMap::from(DEFAULT_PHASE_MINUTES),
            reconcile_max_steps: 8,
            presence_ttl_secs: 45,
            operator_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    default_capacity: Option<usize>,
    phase_minutes: Option<IndexMap<PhaseName, u32>>,
    reconcile_max_steps: Option<usize>,
    presence_ttl_secs: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let mut phase_minutes = defaults.default_phase_minutes;
        if let Some(overrides) = value.phase_minutes {
            for (phase, minutes) in overrides {
                phase_minutes.insert(phase, minutes);
            }
        }
        Self {
            default_capacity: value.default_capacity.unwrap_or(defaults.default_capacity),
            default_phase_minutes: phase_minutes,
            reconcile_max_steps: value
                .reconcile_max_steps
                .unwrap_or(defaults.reconcile_max_steps),
            presence_ttl_secs: value.presence_ttl_secs.unwrap_or(defaults.presence_ttl_secs),
            operator_token: None,
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
    fn partial_config_files_keep_built_in_defaults_for_missing_keys() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"default_capacity": 8, "phase_minutes": {"welcome": 2}}"#)
                .expect("valid raw config");
        let config: AppConfig = raw.into();

        assert_eq!(config.default_capacity, 8);
        assert_eq!(config.default_phase_minutes[&PhaseName::Welcome], 2);
        assert_eq!(config.default_phase_minutes[&PhaseName::Countdown], 15);
        assert_eq!(config.reconcile_max_steps, 8);
    }
}
