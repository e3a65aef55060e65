//! Core data types shared across the pipeline.
//!
//! Everything here is plain immutable data: produced by one stage, consumed
//! read-only by the next and by the report formatter.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifier for one of the two stereo cameras.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraId {
    Cam0,
    Cam1,
}

impl CameraId {
    /// Both cameras, in cam0/cam1 order.
    pub const ALL: [CameraId; 2] = [CameraId::Cam0, CameraId::Cam1];

    /// The opposite camera.
    pub fn other(self) -> CameraId {
        match self {
            CameraId::Cam0 => CameraId::Cam1,
            CameraId::Cam1 => CameraId::Cam0,
        }
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraId::Cam0 => write!(f, "cam0"),
            CameraId::Cam1 => write!(f, "cam1"),
        }
    }
}

/// One video file holding a contiguous slice of a camera's recording.
///
/// Immutable once discovered. `frame_count` is the authoritative total from
/// the media metadata; `segment_number` is the ordering key and is not
/// required to be contiguous across a camera's segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub camera_id: CameraId,
    pub segment_number: u32,
    pub path: PathBuf,
    pub frame_count: u64,
}

/// Metadata for a single frame extracted at a sampling point.
///
/// `global_frame_number` is 1-indexed across the full concatenated stream of
/// one camera and is unique within that camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFrame {
    pub global_frame_number: u64,
    pub camera_id: CameraId,
    pub path: PathBuf,
}

/// Two frames, one per camera, sharing the same global frame number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePair {
    pub global_frame_number: u64,
    pub cam0: ExtractedFrame,
    pub cam1: ExtractedFrame,
}

/// Metadata for a stitched (vertically composed) frame pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchedFrame {
    pub global_frame_number: u64,
    pub path: PathBuf,
}

/// One presentation timestamp from a per-segment timestamp log.
///
/// `frame_index` is 0-indexed within its segment; `pts_us` is the
/// presentation timestamp in microseconds on that camera's own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampRecord {
    #[serde(rename = "i")]
    pub frame_index: u64,
    pub pts_us: i64,
}

/// Counts accumulated over a full run, for the summary and report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub cam0_segments: usize,
    pub cam1_segments: usize,
    pub cam0_total_frames: u64,
    pub cam1_total_frames: u64,
    pub cam0_expected_samples: u64,
    pub cam1_expected_samples: u64,
    pub cam0_extracted: usize,
    pub cam1_extracted: usize,
    pub failed_tasks: usize,
    pub pairs_matched: usize,
    pub cam0_unmatched: usize,
    pub cam1_unmatched: usize,
    pub frames_stitched: usize,
    pub stitch_failures: usize,
}
