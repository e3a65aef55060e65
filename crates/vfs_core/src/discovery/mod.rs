//! Segment discovery and cataloguing.
//!
//! Scans the input directory for per-camera segment files, parses segment
//! numbers out of filenames, probes frame counts and validates that the two
//! cameras' catalogs line up well enough to pair by frame number.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::media::MediaProber;
use crate::models::{CameraId, VideoSegment};

/// Errors from segment discovery. These are input errors: the run aborts.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Input directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filename pattern '{pattern}': {source}")]
    BadPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Discovered segments for both cameras, each list sorted by segment number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentCatalog {
    pub cam0: Vec<VideoSegment>,
    pub cam1: Vec<VideoSegment>,
}

impl SegmentCatalog {
    pub fn for_camera(&self, camera: CameraId) -> &[VideoSegment] {
        match camera {
            CameraId::Cam0 => &self.cam0,
            CameraId::Cam1 => &self.cam1,
        }
    }

    /// Total frame count for one camera (sum over its segments).
    pub fn total_frames(&self, camera: CameraId) -> u64 {
        self.for_camera(camera)
            .iter()
            .map(|s| s.frame_count)
            .sum()
    }
}

/// Outcome of the cross-camera frame-count comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameCountCheck {
    pub exceeds_threshold: bool,
    pub difference_percent: f64,
    pub absolute_difference: u64,
}

/// Scan `input_dir` for segment files matching the per-camera glob patterns.
///
/// The segment number is the last run of digits in the file stem; files with
/// no parseable number or a zero frame count are skipped with a warning,
/// matching the tolerant pairing model (a skipped segment is simply a gap).
/// An unparseable pattern is a fail-fast input error.
pub fn discover(
    input_dir: &Path,
    cam0_pattern: &str,
    cam1_pattern: &str,
    prober: &dyn MediaProber,
) -> Result<SegmentCatalog, DiscoveryError> {
    if !input_dir.exists() {
        return Err(DiscoveryError::MissingDirectory(input_dir.to_path_buf()));
    }
    if !input_dir.is_dir() {
        return Err(DiscoveryError::NotADirectory(input_dir.to_path_buf()));
    }

    let cam0_glob = compile_pattern(cam0_pattern)?;
    let cam1_glob = compile_pattern(cam1_pattern)?;

    let entries = std::fs::read_dir(input_dir).map_err(|source| DiscoveryError::ReadDir {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut catalog = SegmentCatalog::default();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        for (camera, pattern) in [
            (CameraId::Cam0, &cam0_glob),
            (CameraId::Cam1, &cam1_glob),
        ] {
            if !pattern.matches(name) {
                continue;
            }
            if let Some(segment) = probe_segment(&path, camera, prober) {
                match camera {
                    CameraId::Cam0 => catalog.cam0.push(segment),
                    CameraId::Cam1 => catalog.cam1.push(segment),
                }
            }
        }
    }

    catalog.cam0.sort_by_key(|s| s.segment_number);
    catalog.cam1.sort_by_key(|s| s.segment_number);
    Ok(catalog)
}

fn probe_segment(
    path: &Path,
    camera: CameraId,
    prober: &dyn MediaProber,
) -> Option<VideoSegment> {
    let Some(segment_number) = extract_segment_number(path) else {
        warn!("Skipping {}: no segment number in filename", path.display());
        return None;
    };

    let frame_count = match prober.frame_count(path) {
        Ok(count) => count,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };
    if frame_count == 0 {
        warn!("Skipping {}: zero frames reported", path.display());
        return None;
    }

    Some(VideoSegment {
        camera_id: camera,
        segment_number,
        path: path.to_path_buf(),
        frame_count,
    })
}

/// Last run of ASCII digits in the file stem, e.g. `stereo_cam0_sbs_12.mp4`
/// gives 12.
fn extract_segment_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;

    let mut last: Option<&str> = None;
    let mut start = None;
    for (i, c) in stem.char_indices() {
        if c.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            last = Some(&stem[s..i]);
        }
    }
    if let Some(s) = start {
        last = Some(&stem[s..]);
    }

    last.and_then(|digits| digits.parse().ok())
}

fn compile_pattern(pattern: &str) -> Result<Pattern, DiscoveryError> {
    Pattern::new(pattern).map_err(|source| DiscoveryError::BadPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Warnings for segment numbers present for one camera only.
pub fn validate_pairing(catalog: &SegmentCatalog) -> Vec<String> {
    let cam0_numbers: std::collections::BTreeSet<u32> =
        catalog.cam0.iter().map(|s| s.segment_number).collect();
    let cam1_numbers: std::collections::BTreeSet<u32> =
        catalog.cam1.iter().map(|s| s.segment_number).collect();

    let mut warnings = Vec::new();
    for n in cam0_numbers.difference(&cam1_numbers) {
        warnings.push(format!("Segment {n} exists for cam0 but not for cam1"));
    }
    for n in cam1_numbers.difference(&cam0_numbers) {
        warnings.push(format!("Segment {n} exists for cam1 but not for cam0"));
    }
    warnings
}

/// Compare total frame counts against the allowed difference percentage.
///
/// The percentage is relative to the larger total; two empty cameras compare
/// equal.
pub fn frame_count_difference(
    cam0_total: u64,
    cam1_total: u64,
    threshold_percent: f64,
) -> FrameCountCheck {
    let absolute_difference = cam0_total.abs_diff(cam1_total);
    let max_frames = cam0_total.max(cam1_total);

    let difference_percent = if max_frames == 0 {
        0.0
    } else {
        (absolute_difference as f64 / max_frames as f64) * 100.0
    };

    FrameCountCheck {
        exceeds_threshold: difference_percent > threshold_percent,
        difference_percent,
        absolute_difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaResult;

    /// Prober answering from a fixed (filename -> frame count) table.
    struct StubProber(Vec<(&'static str, u64)>);

    impl MediaProber for StubProber {
        fn frame_count(&self, path: &Path) -> MediaResult<u64> {
            let name = path.file_name().unwrap().to_str().unwrap();
            Ok(self
                .0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, c)| *c)
                .unwrap_or(100))
        }
    }

    #[test]
    fn patterns_select_by_camera_marker() {
        let cam0 = compile_pattern("stereo_cam0_sbs_*.mp4").unwrap();
        assert!(cam0.matches("stereo_cam0_sbs_1.mp4"));
        assert!(!cam0.matches("stereo_cam1_sbs_1.mp4"));
        assert!(!cam0.matches("clip.mkv"));
    }

    #[test]
    fn invalid_pattern_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(dir.path(), "cam0_[.mp4", "cam1_*.mp4", &StubProber(vec![]))
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::BadPattern { .. }));
    }

    #[test]
    fn segment_number_is_last_digit_run() {
        assert_eq!(
            extract_segment_number(Path::new("stereo_cam0_sbs_12.mp4")),
            Some(12)
        );
        assert_eq!(extract_segment_number(Path::new("cam1_003.mp4")), Some(3));
        assert_eq!(extract_segment_number(Path::new("no_number.mp4")), None);
    }

    #[test]
    fn discover_sorts_and_splits_by_camera() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "stereo_cam0_sbs_2.mp4",
            "stereo_cam0_sbs_1.mp4",
            "stereo_cam1_sbs_1.mp4",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let catalog = discover(
            dir.path(),
            "stereo_cam0_sbs_*.mp4",
            "stereo_cam1_sbs_*.mp4",
            &StubProber(vec![]),
        )
        .unwrap();

        let cam0_numbers: Vec<u32> = catalog.cam0.iter().map(|s| s.segment_number).collect();
        assert_eq!(cam0_numbers, vec![1, 2]);
        assert_eq!(catalog.cam1.len(), 1);
        assert_eq!(catalog.total_frames(CameraId::Cam0), 200);
    }

    #[test]
    fn discover_skips_zero_frame_segments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cam0_1.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("cam0_2.mp4"), b"x").unwrap();

        let catalog = discover(
            dir.path(),
            "cam0_*.mp4",
            "cam1_*.mp4",
            &StubProber(vec![("cam0_2.mp4", 0)]),
        )
        .unwrap();

        assert_eq!(catalog.cam0.len(), 1);
        assert_eq!(catalog.cam0[0].segment_number, 1);
    }

    #[test]
    fn missing_directory_is_an_input_error() {
        let err = discover(
            Path::new("/nonexistent/input"),
            "*.mp4",
            "*.mp4",
            &StubProber(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingDirectory(_)));
    }

    #[test]
    fn pairing_warnings_name_one_sided_segments() {
        let seg = |camera, n| VideoSegment {
            camera_id: camera,
            segment_number: n,
            path: PathBuf::from(format!("{n}.mp4")),
            frame_count: 10,
        };
        let catalog = SegmentCatalog {
            cam0: vec![seg(CameraId::Cam0, 1), seg(CameraId::Cam0, 2)],
            cam1: vec![seg(CameraId::Cam1, 1), seg(CameraId::Cam1, 3)],
        };

        let warnings = validate_pairing(&catalog);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Segment 2"));
        assert!(warnings[1].contains("Segment 3"));
    }

    #[test]
    fn frame_count_difference_is_relative_to_larger_total() {
        let check = frame_count_difference(15000, 14200, 5.0);
        assert!(check.exceeds_threshold);
        assert_eq!(check.absolute_difference, 800);
        assert!((check.difference_percent - 5.333).abs() < 0.01);

        let ok = frame_count_difference(1000, 990, 5.0);
        assert!(!ok.exceeds_threshold);

        let empty = frame_count_difference(0, 0, 5.0);
        assert!(!empty.exceeds_threshold);
        assert_eq!(empty.difference_percent, 0.0);
    }
}
