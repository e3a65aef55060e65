//! Config manager for loading, saving, and validation.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - `load_or_create` seeds a commented default file on first run
//! - Validation on load rejects values the pipeline cannot run with

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::Settings;
use crate::media::ImageKind;

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages application configuration.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Changes made here are only in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file.
    ///
    /// Returns an error if the file doesn't exist or fails validation.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        validate(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Load config from file, creating it with defaults if it doesn't exist.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            self.load()
        } else {
            self.settings = Settings::default();
            self.save()
        }
    }

    /// Ensure all configured directories exist.
    ///
    /// Creates the output folder and its `cam0`, `cam1` and `stitched`
    /// subfolders. Should be called after `load_or_create()`.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [
            self.output_dir(),
            self.camera_frames_dir("cam0"),
            self.camera_frames_dir("cam1"),
            self.stitched_dir(),
        ] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Root output folder.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_dir)
    }

    /// Per-camera extracted-frame folder under the output root.
    pub fn camera_frames_dir(&self, camera: &str) -> PathBuf {
        self.output_dir().join(camera)
    }

    /// Stitched composite folder under the output root.
    pub fn stitched_dir(&self) -> PathBuf {
        self.output_dir().join("stitched")
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Generate config content with section comments.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# Frame Stitcher configuration\n");
        output.push_str("# This file is auto-generated; edits are preserved until the next save.\n\n");

        let sections: [(&str, String); 4] = [
            (
                "# Input and output locations\n[paths]\n",
                toml::to_string_pretty(&self.settings.paths)?,
            ),
            (
                "# Frame extraction\n[extraction]\n",
                toml::to_string_pretty(&self.settings.extraction)?,
            ),
            (
                "# Timestamp drift analysis\n[analysis]\n",
                toml::to_string_pretty(&self.settings.analysis)?,
            ),
            (
                "# Logging\n[logging]\n",
                toml::to_string_pretty(&self.settings.logging)?,
            ),
        ];

        for (header, body) in sections {
            output.push_str(header);
            output.push_str(&body);
            output.push('\n');
        }
        Ok(output)
    }

    /// Write content to the config file atomically.
    ///
    /// Writes to a temp file first, then renames.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

/// Reject values the pipeline cannot run with.
fn validate(settings: &Settings) -> ConfigResult<()> {
    if settings.extraction.sampling_interval == 0 {
        return Err(ConfigError::Invalid(
            "extraction.sampling_interval must be at least 1".to_string(),
        ));
    }
    if settings.extraction.image_format.parse::<ImageKind>().is_err() {
        return Err(ConfigError::Invalid(format!(
            "extraction.image_format \"{}\" is not one of png, jpg, jpeg",
            settings.extraction.image_format
        )));
    }
    if settings.extraction.task_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "extraction.task_timeout_secs must be at least 1".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&settings.extraction.frame_count_threshold_percent) {
        return Err(ConfigError::Invalid(
            "extraction.frame_count_threshold_percent must be within 0..=100".to_string(),
        ));
    }
    if settings.analysis.sync_threshold_ms <= 0.0 {
        return Err(ConfigError::Invalid(
            "analysis.sync_threshold_ms must be positive".to_string(),
        ));
    }
    if settings.analysis.sample_points == 0 {
        return Err(ConfigError::Invalid(
            "analysis.sample_points must be at least 1".to_string(),
        ));
    }
    Ok(())
}
