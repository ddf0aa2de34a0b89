//! Startup configuration and persisted user settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::ProjectFilter;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Persisted user settings (lives in the OS config directory).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overrides the built-in API URL; the environment still wins.
    pub api_url: Option<String>,
    /// Last board filters used.
    pub filters: ProjectFilter,
}

/// Reads and writes [`Settings`] as JSON.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: Option<PathBuf>,
}

impl SettingsFile {
    /// `settings.json` under the platform config directory. Without a home
    /// directory, settings are neither read nor written.
    pub fn locate() -> Self {
        let path = directories::ProjectDirs::from("com", "mhj", "KanbanBoard")
            .map(|dirs| dirs.config_dir().join("settings.json"));
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load(&self) -> Settings {
        let Some(path) = &self.path else {
            return Settings::default();
        };
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Settings::default();
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed settings file");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Effective client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl BoardConfig {
    /// Defaults, then persisted settings, then environment variables.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `BOARD_API_URL`              | `http://localhost:8080` |
    /// | `BOARD_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `BOARD_SEARCH_DEBOUNCE_MS`   | `500`                   |
    pub fn from_env(settings: &Settings) -> Result<Self, ConfigError> {
        Self::resolve(settings, |var| std::env::var(var).ok())
    }

    fn resolve(
        settings: &Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = settings.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }
        if let Some(url) = lookup("BOARD_API_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty {
                    var: "BOARD_API_URL",
                });
            }
            config.api_url = url.to_string();
        }
        if let Some(secs) = positive(&lookup, "BOARD_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = positive(&lookup, "BOARD_SEARCH_DEBOUNCE_MS")? {
            config.search_debounce = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}
