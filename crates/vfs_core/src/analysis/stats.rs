//! Per-camera timestamp statistics.

use serde::{Deserialize, Serialize};

use super::{AnalysisError, AnalysisResult};
use crate::models::{CameraId, TimestampRecord};

/// Timing statistics for one camera's concatenated timestamp series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampStats {
    pub total_frames: usize,
    pub start_time_us: i64,
    pub end_time_us: i64,
    pub duration_seconds: f64,
    pub avg_framerate: f64,
    pub avg_frame_interval_ms: f64,
    pub frame_interval_std_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
}

impl TimestampStats {
    /// Compute statistics over a series. Needs at least 2 records.
    pub fn compute(camera: CameraId, series: &[TimestampRecord]) -> AnalysisResult<Self> {
        if series.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                camera,
                count: series.len(),
            });
        }

        let start_time_us = series[0].pts_us;
        let end_time_us = series[series.len() - 1].pts_us;
        let duration_seconds = (end_time_us - start_time_us) as f64 / 1_000_000.0;

        let intervals_ms: Vec<f64> = series
            .windows(2)
            .map(|w| (w[1].pts_us - w[0].pts_us) as f64 / 1000.0)
            .collect();

        let avg_frame_interval_ms = mean(&intervals_ms);
        let frame_interval_std_ms = std_dev(&intervals_ms, avg_frame_interval_ms);
        let min_interval_ms = intervals_ms.iter().copied().fold(f64::INFINITY, f64::min);
        let max_interval_ms = intervals_ms
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let avg_framerate = if duration_seconds > 0.0 {
            series.len() as f64 / duration_seconds
        } else {
            0.0
        };

        Ok(Self {
            total_frames: series.len(),
            start_time_us,
            end_time_us,
            duration_seconds,
            avg_framerate,
            avg_frame_interval_ms,
            frame_interval_std_ms,
            min_interval_ms,
            max_interval_ms,
        })
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub(super) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 with fewer than two values.
pub(super) fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pts: &[i64]) -> Vec<TimestampRecord> {
        pts.iter()
            .enumerate()
            .map(|(i, &pts_us)| TimestampRecord {
                frame_index: i as u64,
                pts_us,
            })
            .collect()
    }

    #[test]
    fn stats_for_uniform_30fps_series() {
        // 33.333ms spacing ~ 30fps.
        let pts: Vec<i64> = (0..31).map(|i| i * 33_333).collect();
        let stats = TimestampStats::compute(CameraId::Cam0, &series(&pts)).unwrap();

        assert_eq!(stats.total_frames, 31);
        assert_eq!(stats.start_time_us, 0);
        assert!((stats.avg_frame_interval_ms - 33.333).abs() < 0.001);
        assert!(stats.frame_interval_std_ms < 0.001);
        assert!((stats.avg_framerate - 31.0 / stats.duration_seconds).abs() < 1e-9);
    }

    #[test]
    fn stats_capture_interval_extremes() {
        let stats =
            TimestampStats::compute(CameraId::Cam1, &series(&[0, 30_000, 90_000])).unwrap();
        assert_eq!(stats.min_interval_ms, 30.0);
        assert_eq!(stats.max_interval_ms, 60.0);
        assert!(stats.frame_interval_std_ms > 0.0);
    }

    #[test]
    fn single_record_is_insufficient_data() {
        let err = TimestampStats::compute(CameraId::Cam0, &series(&[0])).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData { count: 1, .. }
        ));
    }

    #[test]
    fn empty_series_is_insufficient_data() {
        assert!(TimestampStats::compute(CameraId::Cam1, &[]).is_err());
    }
}
