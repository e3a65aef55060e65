//! Shared context and state types for the pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::SyncAnalysis;
use crate::config::Settings;
use crate::discovery::SegmentCatalog;
use crate::extraction::{CancelToken, ExtractionOutcome};
use crate::media::{FrameSourceOpener, ImageKind, MediaProber};
use crate::models::RunSummary;
use crate::stitching::{PairingResult, StitchOutcome};

/// Callback asking the operator to confirm continuing past a warning.
///
/// Receives the warning text; returns true to continue. `None` in the
/// context means non-interactive: warn and continue.
pub type ConfirmCallback = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Immutable context shared by every step of a run.
pub struct Context {
    /// Name used in log and error messages.
    pub run_name: String,
    pub settings: Settings,
    /// Cooperative cancellation flag, shared with the extraction pool.
    pub cancel: CancelToken,
    /// Frame source factory, a subprocess decoder in production.
    pub opener: Arc<dyn FrameSourceOpener>,
    /// Metadata prober used during discovery.
    pub prober: Arc<dyn MediaProber>,
    /// Operator confirmation hook.
    pub confirm: Option<ConfirmCallback>,
    /// Output image format, parsed from the config once at startup.
    pub image_kind: ImageKind,
}

impl Context {
    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.input_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_dir)
    }

    pub fn camera_frames_dir(&self, camera: crate::models::CameraId) -> PathBuf {
        self.output_dir().join(camera.to_string())
    }

    pub fn stitched_dir(&self) -> PathBuf {
        self.output_dir().join("stitched")
    }
}

/// Mutable state threaded through the steps of one run.
///
/// Each step reads what earlier steps recorded and appends its own output.
#[derive(Default)]
pub struct RunState {
    pub catalog: Option<SegmentCatalog>,
    pub sync: Option<SyncAnalysis>,
    pub extraction: Option<ExtractionOutcome>,
    pub pairing: Option<PairingResult>,
    pub stitching: Option<StitchOutcome>,
    pub summary: RunSummary,
    pub report_path: Option<PathBuf>,
}

/// Result of executing a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed its work.
    Success,
    /// Step decided not to run, with a reason. Not an error.
    Skipped(String),
}
