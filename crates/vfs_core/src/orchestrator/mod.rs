//! Run orchestration.
//!
//! A run is a fixed sequence of steps over shared state: discover, sync
//! check, extract, stitch, report. The runner validates around each step
//! and honors cancellation at step boundaries.

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use types::{ConfirmCallback, Context, RunState, StepOutcome};

use steps::{DiscoverStep, ExtractStep, ReportStep, StitchStep, SyncCheckStep};

/// The standard frame-stitching pipeline.
pub fn standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(DiscoverStep)
        .with_step(SyncCheckStep)
        .with_step(ExtractStep)
        .with_step(StitchStep)
        .with_step(ReportStep)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::config::Settings;
    use crate::extraction::CancelToken;
    use crate::media::{FrameSource, FrameSourceOpener, ImageKind, MediaProber, MediaResult};
    use image::RgbImage;

    /// Source producing a fixed number of tiny frames, ignoring the path.
    struct FixedSource {
        remaining: u64,
    }

    impl FrameSource for FixedSource {
        fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbImage::new(4, 2)))
        }
    }

    struct FixedOpener {
        frames: u64,
    }

    impl FrameSourceOpener for FixedOpener {
        fn open(&self, _path: &Path) -> MediaResult<Box<dyn FrameSource>> {
            Ok(Box::new(FixedSource {
                remaining: self.frames,
            }))
        }
    }

    struct FixedProber {
        frames: u64,
    }

    impl MediaProber for FixedProber {
        fn frame_count(&self, _path: &Path) -> MediaResult<u64> {
            Ok(self.frames)
        }
    }

    fn write_timestamps(dir: &Path, name: &str, start_us: i64, frames: usize) {
        let mut body = String::new();
        for i in 0..frames {
            body.push_str(&format!(
                "{{\"i\":{i},\"pts_us\":{}}}\n",
                start_us + i as i64 * 33_333
            ));
        }
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn context(input: &Path, output: &Path) -> Context {
        let mut settings = Settings::default();
        settings.paths.input_dir = input.to_string_lossy().into_owned();
        settings.paths.output_dir = output.to_string_lossy().into_owned();
        settings.paths.cam0_pattern = "cam0_*.mp4".to_string();
        settings.paths.cam1_pattern = "cam1_*.mp4".to_string();
        settings.extraction.workers = 2;

        Context {
            run_name: "e2e".to_string(),
            settings,
            cancel: CancelToken::new(),
            opener: Arc::new(FixedOpener { frames: 100 }),
            prober: Arc::new(FixedProber { frames: 100 }),
            confirm: None,
            image_kind: ImageKind::Png,
        }
    }

    fn seed_dirs(input: &Path, output: &Path) {
        std::fs::create_dir_all(input).unwrap();
        for sub in ["cam0", "cam1", "stitched"] {
            std::fs::create_dir_all(output.join(sub)).unwrap();
        }
        for name in ["cam0_1.mp4", "cam0_2.mp4", "cam1_1.mp4", "cam1_2.mp4"] {
            std::fs::write(input.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn full_pipeline_discovers_extracts_stitches_and_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        seed_dirs(&input, &output);

        // 5ms start offset between the cameras, otherwise identical clocks.
        write_timestamps(&input, "cam0_1_timestamps.jsonl", 5_000, 100);
        write_timestamps(&input, "cam0_2_timestamps.jsonl", 5_000 + 100 * 33_333, 100);
        write_timestamps(&input, "cam1_1_timestamps.jsonl", 0, 100);
        write_timestamps(&input, "cam1_2_timestamps.jsonl", 100 * 33_333, 100);

        let ctx = context(&input, &output);
        let mut state = RunState::default();
        let result = standard_pipeline().run(&ctx, &mut state).unwrap();

        assert!(result.all_completed());

        // 200 frames per camera at interval 100: global frames 1 and 101.
        assert_eq!(state.summary.cam0_expected_samples, 2);
        assert_eq!(state.summary.cam0_extracted, 2);
        assert_eq!(state.summary.cam1_extracted, 2);
        assert_eq!(state.summary.pairs_matched, 2);
        assert_eq!(state.summary.frames_stitched, 2);
        assert_eq!(state.summary.stitch_failures, 0);

        let sync = state.sync.as_ref().unwrap();
        assert!((sync.start_delay_ms - 5.0).abs() < 1e-6);

        let report = std::fs::read_to_string(state.report_path.unwrap()).unwrap();
        assert!(report.contains("pairs matched: 2"));
        assert!(report.contains("rating: excellent"));
        assert!(output.join("stitched").join("frame_0001.png").is_file());
    }

    #[test]
    fn stitched_output_follows_configured_image_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        seed_dirs(&input, &output);

        let mut ctx = context(&input, &output);
        ctx.image_kind = ImageKind::Jpg;

        let mut state = RunState::default();
        standard_pipeline().run(&ctx, &mut state).unwrap();

        assert!(output.join("cam0").join("frame_0001.jpg").is_file());
        assert!(output.join("stitched").join("frame_0001.jpg").is_file());
        assert!(!output.join("stitched").join("frame_0001.png").exists());
    }

    #[test]
    fn missing_timestamp_logs_skip_sync_but_finish_run() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        seed_dirs(&input, &output);

        let ctx = context(&input, &output);
        let mut state = RunState::default();
        let result = standard_pipeline().run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_skipped, vec!["Sync check"]);
        assert!(state.sync.is_none());
        assert_eq!(state.summary.frames_stitched, 2);

        let report = std::fs::read_to_string(state.report_path.unwrap()).unwrap();
        assert!(report.contains("unavailable"));
    }

    #[test]
    fn declined_confirmation_aborts_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        seed_dirs(&input, &output);
        // An extra cam0 segment pushes the totals 33% apart.
        std::fs::write(input.join("cam0_3.mp4"), b"x").unwrap();

        let mut ctx = context(&input, &output);
        ctx.confirm = Some(Box::new(|_message| false));

        let mut state = RunState::default();
        let err = standard_pipeline().run(&ctx, &mut state).unwrap_err();
        assert!(err.is_user_abort());
    }

    #[test]
    fn empty_input_directory_fails_discovery() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        let ctx = context(&input, &output);
        let mut state = RunState::default();
        let err = standard_pipeline().run(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, PipelineError::StepFailed { .. }));
    }
}
