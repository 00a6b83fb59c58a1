//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/tetrs-rules/settings.toml (or platform equivalent)

use crate::bag::DEFAULT_PREVIEW_LEN;
use crate::game::GameConfig;
use crate::score::ScoringRule;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to read or write the settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gameplay: GameplaySettings,
    pub timing: TimingSettings,
}

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Level floor for new games
    pub start_level: u32,
    /// Length of the "next" preview
    pub preview_count: usize,
    pub scoring: ScoringRule,
    /// Fixed bag seed; random when absent
    pub seed: Option<u64>,
}

/// Timing settings, all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub lock_delay_ms: u64,
    /// Delay between column pairs while clearing rows
    pub clear_step_ms: u64,
    /// Delay before floating rows drop
    pub fill_step_ms: u64,
    /// How long a T-spin callout stays up
    pub callout_ms: u64,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            start_level: 1,
            preview_count: DEFAULT_PREVIEW_LEN,
            scoring: ScoringRule::Classic,
            seed: None,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            lock_delay_ms: 500,
            clear_step_ms: 30,
            fill_step_ms: 50,
            callout_ms: 500,
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "tetrs", "tetrs-rules")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the config directory, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save settings to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Runtime configuration for a game
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            start_level: self.gameplay.start_level.max(1),
            preview_count: self.gameplay.preview_count.max(1),
            scoring: self.gameplay.scoring,
            seed: self.gameplay.seed,
            lock_delay: Duration::from_millis(self.timing.lock_delay_ms),
            clear_step: Duration::from_millis(self.timing.clear_step_ms),
            fill_step: Duration::from_millis(self.timing.fill_step_ms),
            callout: Duration::from_millis(self.timing.callout_ms),
        }
    }
}
