//! Timestamp log loading.
//!
//! Each segment has a JSONL sidecar (`<stem>_timestamps.jsonl`, with any
//! `_sbs` marker dropped from the stem) holding one record per decoded
//! frame. Per-camera series are the per-segment logs concatenated in
//! segment-number order.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, warn};

use crate::models::{TimestampRecord, VideoSegment};

/// Sidecar log path for a segment, derived from the video filename.
///
/// `stereo_cam0_sbs_1.mp4` maps to `stereo_cam0_1_timestamps.jsonl` next to
/// the video file.
pub fn timestamp_log_path(segment: &VideoSegment) -> PathBuf {
    let stem = segment
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().replace("_sbs", ""))
        .unwrap_or_default();
    let dir = segment.path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}_timestamps.jsonl"))
}

/// Load one segment's timestamp series.
///
/// A missing log yields an empty series with a warning; malformed lines are
/// skipped and a read error mid-file keeps what was loaded so far, with a
/// warning. Never fails: timestamp data is advisory.
pub fn load_series(segment: &VideoSegment) -> Vec<TimestampRecord> {
    let path = timestamp_log_path(segment);
    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(_) => {
            warn!("Timestamp log not found: {}", path.display());
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(
                    "Stopped reading {} early after {} records: {}",
                    path.display(),
                    records.len(),
                    e
                );
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TimestampRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed timestamp line in {}: {}", path.display(), e),
        }
    }

    debug!("Loaded {} timestamps from {}", records.len(), path.display());
    records
}

/// Load and concatenate one camera's series in segment-number order.
///
/// Per-segment logs are disjoint files, so they load on independent threads;
/// the merge order is fixed by segment number, not completion order.
pub fn load_camera_series(segments: &[VideoSegment]) -> Vec<TimestampRecord> {
    let mut loaded: Vec<(u32, Vec<TimestampRecord>)> = thread::scope(|scope| {
        let handles: Vec<_> = segments
            .iter()
            .map(|segment| {
                scope.spawn(move || (segment.segment_number, load_series(segment)))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or((0, Vec::new())))
            .collect()
    });

    loaded.sort_by_key(|(number, _)| *number);
    loaded.into_iter().flat_map(|(_, series)| series).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CameraId;

    fn segment(dir: &Path, name: &str, number: u32) -> VideoSegment {
        VideoSegment {
            camera_id: CameraId::Cam0,
            segment_number: number,
            path: dir.join(name),
            frame_count: 10,
        }
    }

    #[test]
    fn log_path_drops_sbs_marker() {
        let seg = segment(Path::new("/data"), "stereo_cam0_sbs_1.mp4", 1);
        assert_eq!(
            timestamp_log_path(&seg),
            Path::new("/data/stereo_cam0_1_timestamps.jsonl")
        );
    }

    #[test]
    fn missing_log_yields_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let seg = segment(dir.path(), "cam0_1.mp4", 1);
        assert!(load_series(&seg).is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cam0_1_timestamps.jsonl"),
            "{\"i\":0,\"pts_us\":1000}\nnot json\n\n{\"i\":1,\"pts_us\":2000}\n",
        )
        .unwrap();

        let seg = segment(dir.path(), "cam0_1.mp4", 1);
        let series = load_series(&seg);
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].pts_us, 2000);
    }

    #[test]
    fn read_error_mid_file_keeps_earlier_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = b"{\"i\":0,\"pts_us\":1000}\n".to_vec();
        body.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        body.extend_from_slice(b"\n{\"i\":1,\"pts_us\":2000}\n");
        std::fs::write(dir.path().join("cam0_1_timestamps.jsonl"), body).unwrap();

        let seg = segment(dir.path(), "cam0_1.mp4", 1);
        let series = load_series(&seg);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].pts_us, 1000);
    }

    #[test]
    fn camera_series_concatenates_in_segment_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cam0_2_timestamps.jsonl"),
            "{\"i\":0,\"pts_us\":3000}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("cam0_1_timestamps.jsonl"),
            "{\"i\":0,\"pts_us\":1000}\n{\"i\":1,\"pts_us\":2000}\n",
        )
        .unwrap();

        // Listed out of order; the merge is by segment number.
        let segments = vec![
            segment(dir.path(), "cam0_2.mp4", 2),
            segment(dir.path(), "cam0_1.mp4", 1),
        ];
        let series = load_camera_series(&segments);

        let pts: Vec<i64> = series.iter().map(|r| r.pts_us).collect();
        assert_eq!(pts, vec![1000, 2000, 3000]);
    }
}
