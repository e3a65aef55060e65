//! Timestamp-based synchronization analysis.
//!
//! Reduces the two cameras' raw timestamp series to per-camera timing
//! statistics and cross-camera drift, then folds them into a qualitative
//! go/no-go rating. Purely advisory: the analyzer never blocks or alters
//! the extraction and pairing pipeline.

mod drift;
mod loader;
mod stats;

pub use drift::{DriftDistribution, DriftSample, SyncAnalysis, SyncAnalyzer, SyncRating};
pub use loader::{load_camera_series, load_series, timestamp_log_path};
pub use stats::TimestampStats;

use thiserror::Error;

/// Errors from the analyzer. All of them downgrade the analysis to
/// "unavailable" at the orchestration level.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{camera} has {count} timestamp records, need at least 2")]
    InsufficientData {
        camera: crate::models::CameraId,
        count: usize,
    },
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
