//! Per-segment extraction tasks.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::discovery::SegmentCatalog;
use crate::media::{persist_frame, FrameSourceOpener, ImageKind};
use crate::models::{CameraId, ExtractedFrame, VideoSegment};
use crate::sampling::{compute_offsets, should_sample};

/// One independent unit of extraction work: a single segment of a single
/// camera, with the global offset precomputed by the orchestrator.
///
/// Immutable; created once, consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct ExtractionTask {
    pub segment: Arc<VideoSegment>,
    /// Sum of frame counts of all same-camera segments ordered before this
    /// one: the global number of local frame i (1-indexed) is offset + i.
    pub global_frame_offset: u64,
    pub sampling_interval: u32,
    pub output_dir: PathBuf,
    pub image_kind: ImageKind,
}

impl ExtractionTask {
    pub fn camera_id(&self) -> CameraId {
        self.segment.camera_id
    }
}

/// Build the full task list for both cameras.
///
/// Offsets are computed per camera via the exclusive prefix sum over
/// segment-number order, so tasks may later complete in any order without
/// affecting global numbering.
pub fn build_tasks(
    catalog: &SegmentCatalog,
    sampling_interval: u32,
    cam0_dir: &std::path::Path,
    cam1_dir: &std::path::Path,
    image_kind: ImageKind,
) -> Vec<ExtractionTask> {
    let mut tasks = Vec::new();

    for camera in CameraId::ALL {
        let segments = catalog.for_camera(camera);
        let offsets = compute_offsets(segments);
        let output_dir = match camera {
            CameraId::Cam0 => cam0_dir,
            CameraId::Cam1 => cam1_dir,
        };

        for segment in segments {
            tasks.push(ExtractionTask {
                global_frame_offset: offsets[&segment.segment_number],
                segment: Arc::new(segment.clone()),
                sampling_interval,
                output_dir: output_dir.to_path_buf(),
                image_kind,
            });
        }
    }

    tasks
}

/// Extract all sampling points of one segment.
///
/// Decodes frames sequentially, applies the sampling predicate to each
/// frame's global number and persists matches. Failures are contained per
/// the batch policy: a segment that cannot be opened or fully decoded yields
/// an empty result, a single frame that fails to persist is skipped, and the
/// caller's batch always proceeds.
pub fn run_segment_task(
    task: &ExtractionTask,
    opener: &dyn FrameSourceOpener,
) -> Vec<ExtractedFrame> {
    let segment = &task.segment;

    let mut source = match opener.open(&segment.path) {
        Ok(source) => source,
        Err(e) => {
            error!(
                "{} segment {}: cannot open {}: {}",
                segment.camera_id,
                segment.segment_number,
                segment.path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut extracted = Vec::new();
    let mut local_frame_number = 0u64;

    loop {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                error!(
                    "{} segment {}: decode failed at local frame {}: {}",
                    segment.camera_id,
                    segment.segment_number,
                    local_frame_number + 1,
                    e
                );
                return Vec::new();
            }
        };

        local_frame_number += 1;
        let global_frame_number = task.global_frame_offset + local_frame_number;

        if !should_sample(global_frame_number, task.sampling_interval) {
            continue;
        }

        match persist_frame(&frame, &task.output_dir, global_frame_number, task.image_kind) {
            Ok(path) => extracted.push(ExtractedFrame {
                global_frame_number,
                camera_id: segment.camera_id,
                path,
            }),
            Err(e) => {
                warn!(
                    "{} segment {}: skipping frame {}: {}",
                    segment.camera_id, segment.segment_number, global_frame_number, e
                );
                continue;
            }
        }
    }

    debug!(
        "{} segment {}: extracted {} frames",
        segment.camera_id,
        segment.segment_number,
        extracted.len()
    );
    extracted
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;
    use crate::media::{FrameSource, MediaError, MediaResult};
    use crate::models::CameraId;
    use image::RgbImage;

    /// Source producing a fixed number of tiny frames.
    pub(crate) struct StubSource {
        remaining: u64,
    }

    impl FrameSource for StubSource {
        fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbImage::new(4, 2)))
        }
    }

    /// Source that blocks long enough to trip any sub-second stall bound.
    pub(crate) struct StallSource;

    impl FrameSource for StallSource {
        fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
            std::thread::sleep(std::time::Duration::from_secs(2));
            Ok(None)
        }
    }

    /// Opener producing a StubSource sized from the probed segment, failing
    /// for paths containing "missing" and hanging for paths containing
    /// "stall".
    pub(crate) struct StubOpener;

    impl FrameSourceOpener for StubOpener {
        fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
            if path.to_string_lossy().contains("missing") {
                return Err(MediaError::OpenFailed {
                    path: path.to_path_buf(),
                    message: "stub: unreadable".to_string(),
                });
            }
            if path.to_string_lossy().contains("stall") {
                return Ok(Box::new(StallSource));
            }
            // Stem encodes the frame count, e.g. "100.mp4".
            let frames = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.rsplit('_').next())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            Ok(Box::new(StubSource { remaining: frames }))
        }
    }

    pub(crate) fn make_task(
        camera: CameraId,
        segment_number: u32,
        frame_count: u64,
        offset: u64,
        interval: u32,
        dir: &Path,
    ) -> ExtractionTask {
        ExtractionTask {
            segment: Arc::new(VideoSegment {
                camera_id: camera,
                segment_number,
                path: PathBuf::from(format!("seg_{frame_count}.mp4")),
                frame_count,
            }),
            global_frame_offset: offset,
            sampling_interval: interval,
            output_dir: dir.to_path_buf(),
            image_kind: ImageKind::Png,
        }
    }

    #[test]
    fn task_extracts_global_sampling_points() {
        let dir = tempfile::tempdir().unwrap();
        // Segment 2 of a 100-frames-per-segment stream: offset 100.
        let task = make_task(CameraId::Cam0, 2, 100, 100, 100, dir.path());

        let frames = run_segment_task(&task, &StubOpener);

        let numbers: Vec<u64> = frames.iter().map(|f| f.global_frame_number).collect();
        assert_eq!(numbers, vec![101, 201]);
        assert!(frames.iter().all(|f| f.path.exists()));
    }

    #[test]
    fn unreadable_segment_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = make_task(CameraId::Cam1, 1, 100, 0, 100, dir.path());
        task = ExtractionTask {
            segment: Arc::new(VideoSegment {
                path: PathBuf::from("missing_100.mp4"),
                ..(*task.segment).clone()
            }),
            ..task
        };

        assert!(run_segment_task(&task, &StubOpener).is_empty());
    }

    #[test]
    fn persist_failure_skips_frame_and_continues() {
        // Nonexistent output dir: every persist fails, no panic, empty set.
        let task = make_task(
            CameraId::Cam0,
            1,
            250,
            0,
            100,
            Path::new("/nonexistent/out"),
        );
        assert!(run_segment_task(&task, &StubOpener).is_empty());
    }

    #[test]
    fn build_tasks_carries_per_camera_offsets() {
        let seg = |camera, n, count| VideoSegment {
            camera_id: camera,
            segment_number: n,
            path: PathBuf::from(format!("{camera}_{n}.mp4")),
            frame_count: count,
        };
        let catalog = crate::discovery::SegmentCatalog {
            cam0: vec![seg(CameraId::Cam0, 1, 100), seg(CameraId::Cam0, 2, 150)],
            cam1: vec![seg(CameraId::Cam1, 1, 120)],
        };

        let tasks = build_tasks(
            &catalog,
            100,
            Path::new("out/cam0"),
            Path::new("out/cam1"),
            ImageKind::Png,
        );

        assert_eq!(tasks.len(), 3);
        let cam0_offsets: Vec<u64> = tasks
            .iter()
            .filter(|t| t.camera_id() == CameraId::Cam0)
            .map(|t| t.global_frame_offset)
            .collect();
        assert_eq!(cam0_offsets, vec![0, 100]);
        assert_eq!(tasks[2].global_frame_offset, 0);
        assert!(tasks[0].output_dir.ends_with("cam0"));
    }
}
