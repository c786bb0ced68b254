//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the bot looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MYTHOS_HERALD_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Prefix that marks a chat message as a text command.
    pub command_prefix: String,
    /// Role required for event administration commands. Leaving it unset is
    /// a deliberate lockout: the admin gate fails fast instead of passing
    /// everyone.
    pub admin_role: Option<String>,
    /// Where game records are persisted.
    pub data_path: PathBuf,
    /// Wall-clock seconds per countdown minute. Production wants 60; tests
    /// and rehearsals can compress the clock.
    pub timer_tick_seconds: u64,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults
    /// when the file is missing or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".into(),
            admin_role: None,
            data_path: PathBuf::from("data/games.json"),
            timer_tick_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_prefix")]
    command_prefix: String,
    #[serde(default)]
    admin_role: Option<String>,
    #[serde(default = "default_data_path")]
    data_path: PathBuf,
    #[serde(default = "default_tick_seconds")]
    timer_tick_seconds: u64,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            command_prefix: value.command_prefix,
            admin_role: value.admin_role,
            data_path: value.data_path,
            timer_tick_seconds: value.timer_tick_seconds,
        }
    }
}

fn default_prefix() -> String {
    "!".into()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/games.json")
}

fn default_tick_seconds() -> u64 {
    60
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
