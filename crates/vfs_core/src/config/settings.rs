//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field has a serde default, so a partial file loads cleanly.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Frame extraction settings.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Sync analysis settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Input directory and output folder layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory scanned for segment files.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Root folder for extracted and stitched frames plus the run report.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Glob pattern for cam0 segment filenames.
    #[serde(default = "default_cam0_pattern")]
    pub cam0_pattern: String,

    /// Glob pattern for cam1 segment filenames.
    #[serde(default = "default_cam1_pattern")]
    pub cam1_pattern: String,
}

fn default_input_dir() -> String {
    ".".to_string()
}

fn default_output_dir() -> String {
    "frame_output".to_string()
}

fn default_cam0_pattern() -> String {
    "*cam0*.mp4".to_string()
}

fn default_cam1_pattern() -> String {
    "*cam1*.mp4".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            cam0_pattern: default_cam0_pattern(),
            cam1_pattern: default_cam1_pattern(),
        }
    }
}

/// Frame extraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Sample every Nth frame of the global sequence.
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval: u32,

    /// Output image format: "png", "jpg" (or "jpeg").
    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// Worker threads; 0 means one per available core.
    #[serde(default)]
    pub workers: usize,

    /// Per-task stall timeout in seconds.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Abort threshold for cross-camera frame count mismatch, percent.
    #[serde(default = "default_frame_count_threshold")]
    pub frame_count_threshold_percent: f64,
}

fn default_sampling_interval() -> u32 {
    100
}

fn default_image_format() -> String {
    "png".to_string()
}

fn default_task_timeout_secs() -> u64 {
    300
}

fn default_frame_count_threshold() -> f64 {
    5.0
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            sampling_interval: default_sampling_interval(),
            image_format: default_image_format(),
            workers: 0,
            task_timeout_secs: default_task_timeout_secs(),
            frame_count_threshold_percent: default_frame_count_threshold(),
        }
    }
}

/// Sync analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Run timestamp drift analysis before extraction.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Drift considered acceptable, milliseconds.
    #[serde(default = "default_sync_threshold_ms")]
    pub sync_threshold_ms: f64,

    /// Maximum drift sample points per run.
    #[serde(default = "default_sample_points")]
    pub sample_points: usize,
}

fn default_sync_threshold_ms() -> f64 {
    50.0
}

fn default_sample_points() -> usize {
    20
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_threshold_ms: default_sync_threshold_ms(),
            sample_points: default_sample_points(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default log filter, overridable with `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Compact single-line output.
    #[serde(default = "default_true")]
    pub compact: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            compact: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.extraction.sampling_interval, 100);
        assert_eq!(settings.extraction.image_format, "png");
        assert_eq!(settings.extraction.frame_count_threshold_percent, 5.0);
        assert_eq!(settings.analysis.sync_threshold_ms, 50.0);
        assert_eq!(settings.analysis.sample_points, 20);
    }

    #[test]
    fn partial_toml_fills_missing_fields_with_defaults() {
        let settings: Settings =
            toml::from_str("[extraction]\nsampling_interval = 30\n").unwrap();
        assert_eq!(settings.extraction.sampling_interval, 30);
        assert_eq!(settings.extraction.image_format, "png");
        assert_eq!(settings.paths.output_dir, "frame_output");
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back.extraction.sampling_interval, 100);
        assert_eq!(back.paths.cam0_pattern, "*cam0*.mp4");
    }
}
