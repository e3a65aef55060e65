//! Configuration management.
//!
//! TOML-based configuration with logical sections, atomic file writes
//! (write to temp, then rename) and validation on load.
//!
//! # Example
//!
//! ```no_run
//! use vfs_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("config.toml");
//! config.load_or_create().unwrap();
//! config.ensure_dirs_exist().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_dir);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AnalysisSettings, ExtractionSettings, LoggingSettings, PathSettings, Settings,
};
