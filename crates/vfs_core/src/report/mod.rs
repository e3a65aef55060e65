//! Plain-text run report.
//!
//! One human-readable file per run summarizing what was discovered,
//! extracted, paired and stitched, plus the sync analysis when available.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::analysis::SyncAnalysis;
use crate::discovery::frame_count_difference;
use crate::models::RunSummary;

/// Everything the report formatter needs from a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    /// Present when timestamp logs allowed the analysis to run.
    pub sync: Option<SyncAnalysis>,
}

impl RunReport {
    /// Render the report as plain text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let line = "=".repeat(60);

        out.push_str(&line);
        out.push_str("\nFrame Stitcher run report\n");
        out.push_str(&format!(
            "Generated: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&line);
        out.push('\n');

        let s = &self.summary;
        out.push_str("\n[Input]\n");
        out.push_str(&format!(
            "  cam0: {} segments, {} frames\n",
            s.cam0_segments, s.cam0_total_frames
        ));
        out.push_str(&format!(
            "  cam1: {} segments, {} frames\n",
            s.cam1_segments, s.cam1_total_frames
        ));
        let check = frame_count_difference(s.cam0_total_frames, s.cam1_total_frames, 100.0);
        out.push_str(&format!(
            "  frame count difference: {} frames ({:.1}%)\n",
            check.absolute_difference, check.difference_percent
        ));

        out.push_str("\n[Extraction]\n");
        out.push_str(&format!(
            "  cam0: {} extracted ({} expected)\n",
            s.cam0_extracted, s.cam0_expected_samples
        ));
        out.push_str(&format!(
            "  cam1: {} extracted ({} expected)\n",
            s.cam1_extracted, s.cam1_expected_samples
        ));
        out.push_str(&format!("  failed segment tasks: {}\n", s.failed_tasks));

        out.push_str("\n[Pairing and stitching]\n");
        out.push_str(&format!("  pairs matched: {}\n", s.pairs_matched));
        out.push_str(&format!(
            "  unmatched: {} cam0, {} cam1\n",
            s.cam0_unmatched, s.cam1_unmatched
        ));
        out.push_str(&format!(
            "  stitched: {} ({} failures)\n",
            s.frames_stitched, s.stitch_failures
        ));

        match &self.sync {
            Some(sync) => out.push_str(&render_sync(sync)),
            None => out.push_str("\n[Sync analysis]\n  unavailable (no usable timestamp logs)\n"),
        }

        out
    }

    /// Write the report to `<output_dir>/run_report.txt`.
    pub fn write(&self, output_dir: &Path) -> io::Result<PathBuf> {
        let path = output_dir.join("run_report.txt");
        std::fs::write(&path, self.render())?;
        info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn render_sync(sync: &SyncAnalysis) -> String {
    let mut out = String::new();
    out.push_str("\n[Sync analysis]\n");
    out.push_str(&format!("  rating: {}\n", sync.rating));
    out.push_str(&format!(
        "  start delay: {:+.1} ms (cam0 - cam1)\n",
        sync.start_delay_ms
    ));
    out.push_str(&format!(
        "  duration difference: {:+.3} s\n",
        sync.duration_diff_seconds
    ));
    out.push_str(&format!(
        "  drift: avg {:.1} ms, max {:.1} ms, std {:.1} ms over {} samples\n",
        sync.avg_drift_ms,
        sync.max_drift_ms,
        sync.drift_std_ms,
        sync.samples.len()
    ));

    let d = &sync.distribution;
    out.push_str(&format!(
        "  distribution: <10ms {}, 10-30ms {}, 30-50ms {}, >=50ms {}\n",
        d.under_10ms, d.from_10_to_30ms, d.from_30_to_50ms, d.over_50ms
    ));

    for (camera, stats) in [("cam0", &sync.cam0_stats), ("cam1", &sync.cam1_stats)] {
        out.push_str(&format!(
            "  {camera}: {} frames, {:.2} fps avg, interval {:.1}±{:.1} ms\n",
            stats.total_frames,
            stats.avg_framerate,
            stats.avg_frame_interval_ms,
            stats.frame_interval_std_ms
        ));
    }

    out.push_str("  recommendations:\n");
    for recommendation in &sync.recommendations {
        out.push_str(&format!("    - {recommendation}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SyncAnalyzer;
    use crate::models::TimestampRecord;

    fn summary() -> RunSummary {
        RunSummary {
            cam0_segments: 3,
            cam1_segments: 3,
            cam0_total_frames: 300,
            cam1_total_frames: 300,
            cam0_expected_samples: 3,
            cam1_expected_samples: 3,
            cam0_extracted: 3,
            cam1_extracted: 3,
            pairs_matched: 3,
            frames_stitched: 3,
            ..Default::default()
        }
    }

    fn analysis() -> SyncAnalysis {
        let series: Vec<TimestampRecord> = (0..10)
            .map(|i| TimestampRecord {
                frame_index: i,
                pts_us: i as i64 * 33_333,
            })
            .collect();
        SyncAnalyzer::default().analyze(&series, &series).unwrap()
    }

    #[test]
    fn report_without_analysis_marks_it_unavailable() {
        let report = RunReport {
            summary: summary(),
            sync: None,
        };
        let text = report.render();
        assert!(text.contains("pairs matched: 3"));
        assert!(text.contains("unavailable"));
    }

    #[test]
    fn report_includes_sync_sections() {
        let report = RunReport {
            summary: summary(),
            sync: Some(analysis()),
        };
        let text = report.render();
        assert!(text.contains("rating: excellent"));
        assert!(text.contains("recommendations:"));
        assert!(text.contains("cam0: 10 frames"));
    }

    #[test]
    fn report_writes_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport {
            summary: summary(),
            sync: None,
        };
        let path = report.write(dir.path()).unwrap();
        assert!(path.ends_with("run_report.txt"));
        assert!(std::fs::read_to_string(path).unwrap().contains("[Input]"));
    }
}
