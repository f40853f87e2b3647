//! Configuration management for snap-jot.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, command-line overrides, and atomic write operations.

use crate::{
    AppError, AppResult, Cli,
    config::{CaptureConfig, ContentConfig, PolicyKind},
};

use snap_jot_core::{ChunkingPolicy, SessionConfig};

use std::{
    fs,
    io::Write,
    num::NonZeroUsize,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Capture timing and chunking.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Codec settings.
    #[serde(default)]
    pub content: ContentConfig,
}

impl Config {
    /// Load configuration from `path`, or from the per-user config file.
    ///
    /// A missing per-user file is created with defaults. A missing explicit
    /// path is an error.
    #[track_caller]
    #[instrument]
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Read and parse one TOML file.
    #[track_caller]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config {}: {}", path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config = Self::from_toml(&contents)?;
        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Parse configuration from TOML text. Missing sections take defaults.
    #[track_caller]
    pub fn from_toml(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Save configuration to the per-user config file.
    #[track_caller]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(policy) = cli.policy {
            self.capture.policy = policy;
        }
        if let Some(secs) = cli.slice_interval {
            self.capture.slice_interval_secs = secs;
        }
        if let Some(count) = cli.slices_per_segment {
            self.capture.slices_per_segment = count;
        }
    }

    /// Build the session settings, validating every field.
    #[track_caller]
    pub fn session_config(&self) -> AppResult<SessionConfig> {
        let slice_interval = SessionConfig::slice_interval_from_secs(
            self.capture.slice_interval_secs,
        )
        .map_err(|e| AppError::ConfigError {
            reason: format!("capture.slice_interval_secs: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let policy = match self.capture.policy {
            PolicyKind::Continuous => ChunkingPolicy::Continuous,
            PolicyKind::Grouped => {
                let slices_per_segment = NonZeroUsize::new(self.capture.slices_per_segment)
                    .ok_or_else(|| AppError::ConfigError {
                        reason: "capture.slices_per_segment must be at least 1".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                ChunkingPolicy::Grouped { slices_per_segment }
            }
        };

        if self.content.mime_type.trim().is_empty() {
            return Err(AppError::ConfigError {
                reason: "content.mime_type must not be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(SessionConfig {
            slice_interval,
            policy,
            content: (&self.content).into(),
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "snap-jot", "Snap-Jot").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }
}
