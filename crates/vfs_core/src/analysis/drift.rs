//! Cross-camera drift analysis and sync quality rating.
//!
//! Drift is measured index-by-index between the two series (the cameras
//! need not have identical frame counts, so matching is positional, not by
//! global frame number). All functions are pure - no I/O, no side effects.

use serde::{Deserialize, Serialize};

use super::stats::{mean, std_dev, TimestampStats};
use super::AnalysisResult;
use crate::models::{CameraId, TimestampRecord};

/// One sampled drift measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftSample {
    /// Index into both series.
    pub index: usize,
    /// cam0 time at the index, seconds from that camera's own start.
    pub cam0_secs: f64,
    /// cam1 time at the index, seconds from that camera's own start.
    pub cam1_secs: f64,
    /// Signed drift cam0 - cam1 in milliseconds.
    pub drift_ms: f64,
}

/// Histogram of absolute drift magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftDistribution {
    /// `< 10ms`
    pub under_10ms: usize,
    /// `[10, 30)ms`
    pub from_10_to_30ms: usize,
    /// `[30, 50)ms`
    pub from_30_to_50ms: usize,
    /// `>= 50ms`
    pub over_50ms: usize,
}

impl DriftDistribution {
    fn record(&mut self, abs_drift_ms: f64) {
        if abs_drift_ms < 10.0 {
            self.under_10ms += 1;
        } else if abs_drift_ms < 30.0 {
            self.from_10_to_30ms += 1;
        } else if abs_drift_ms < 50.0 {
            self.from_30_to_50ms += 1;
        } else {
            self.over_50ms += 1;
        }
    }

    /// Total samples across all buckets.
    pub fn total(&self) -> usize {
        self.under_10ms + self.from_10_to_30ms + self.from_30_to_50ms + self.over_50ms
    }
}

/// Qualitative synchronization rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl std::fmt::Display for SyncRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncRating::Excellent => write!(f, "excellent"),
            SyncRating::Good => write!(f, "good"),
            SyncRating::Fair => write!(f, "fair"),
            SyncRating::Poor => write!(f, "poor"),
        }
    }
}

/// Band classification shared by average drift and start delay.
fn classify_ms(value_ms: f64) -> SyncRating {
    if value_ms < 10.0 {
        SyncRating::Excellent
    } else if value_ms < 30.0 {
        SyncRating::Good
    } else if value_ms < 50.0 {
        SyncRating::Fair
    } else {
        SyncRating::Poor
    }
}

/// Complete synchronization analysis between the two cameras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAnalysis {
    pub cam0_stats: TimestampStats,
    pub cam1_stats: TimestampStats,
    /// cam0 start minus cam1 start, milliseconds (signed).
    pub start_delay_ms: f64,
    /// cam0 duration minus cam1 duration, seconds (signed).
    pub duration_diff_seconds: f64,
    /// Statistics over absolute drift.
    pub avg_drift_ms: f64,
    pub max_drift_ms: f64,
    pub drift_std_ms: f64,
    pub distribution: DriftDistribution,
    /// Sampled (index, drift) tuples, ascending by index, signed drift.
    pub samples: Vec<DriftSample>,
    pub rating: SyncRating,
    pub recommendations: Vec<String>,
}

/// Analyzer configured with the operator's drift tolerance.
#[derive(Debug, Clone, Copy)]
pub struct SyncAnalyzer {
    /// Operator's acceptability threshold, echoed into the report.
    pub sync_threshold_ms: f64,
    /// Maximum number of drift sample points.
    pub sample_points: usize,
}

impl Default for SyncAnalyzer {
    fn default() -> Self {
        Self {
            sync_threshold_ms: 50.0,
            sample_points: 20,
        }
    }
}

impl SyncAnalyzer {
    pub fn new(sync_threshold_ms: f64, sample_points: usize) -> Self {
        Self {
            sync_threshold_ms,
            sample_points,
        }
    }

    /// Analyze sync quality between the two concatenated series.
    ///
    /// Fails only on insufficient data (fewer than 2 records for either
    /// camera); the caller treats that as "analysis unavailable".
    pub fn analyze(
        &self,
        cam0: &[TimestampRecord],
        cam1: &[TimestampRecord],
    ) -> AnalysisResult<SyncAnalysis> {
        let cam0_stats = TimestampStats::compute(CameraId::Cam0, cam0)?;
        let cam1_stats = TimestampStats::compute(CameraId::Cam1, cam1)?;

        let start_delay_ms = (cam0_stats.start_time_us - cam1_stats.start_time_us) as f64 / 1000.0;
        let duration_diff_seconds = cam0_stats.duration_seconds - cam1_stats.duration_seconds;

        let samples = self.sample_drift(cam0, cam1);
        let abs_drifts: Vec<f64> = samples.iter().map(|s| s.drift_ms.abs()).collect();

        let avg_drift_ms = mean(&abs_drifts);
        let max_drift_ms = abs_drifts.iter().copied().fold(0.0, f64::max);
        let drift_std_ms = std_dev(&abs_drifts, avg_drift_ms);

        let mut distribution = DriftDistribution::default();
        for drift in &abs_drifts {
            distribution.record(*drift);
        }

        let rating = overall_rating(avg_drift_ms, start_delay_ms);
        let recommendations =
            build_recommendations(avg_drift_ms, max_drift_ms, &distribution);

        Ok(SyncAnalysis {
            cam0_stats,
            cam1_stats,
            start_delay_ms,
            duration_diff_seconds,
            avg_drift_ms,
            max_drift_ms,
            drift_std_ms,
            distribution,
            samples,
            rating,
            recommendations,
        })
    }

    /// Deterministic, evenly spaced sample indices over the shorter series.
    ///
    /// With `m` common indices and `m <= sample_points` every index is
    /// taken; otherwise `sample_points` indices spaced by `m / sample_points`
    /// starting at 0 (integer step, ties always favor the lower index).
    fn sample_drift(
        &self,
        cam0: &[TimestampRecord],
        cam1: &[TimestampRecord],
    ) -> Vec<DriftSample> {
        let m = cam0.len().min(cam1.len());
        let indices: Vec<usize> = if m <= self.sample_points {
            (0..m).collect()
        } else {
            let step = m / self.sample_points;
            (0..self.sample_points).map(|i| i * step).collect()
        };

        indices
            .into_iter()
            .map(|index| {
                let cam0_us = cam0[index].pts_us;
                let cam1_us = cam1[index].pts_us;
                DriftSample {
                    index,
                    cam0_secs: (cam0_us - cam0[0].pts_us) as f64 / 1_000_000.0,
                    cam1_secs: (cam1_us - cam1[0].pts_us) as f64 / 1_000_000.0,
                    drift_ms: (cam0_us - cam1_us) as f64 / 1000.0,
                }
            })
            .collect()
    }
}

/// Decision table combining the average-drift and start-delay bands.
fn overall_rating(avg_drift_ms: f64, start_delay_ms: f64) -> SyncRating {
    let drift = classify_ms(avg_drift_ms);
    let start = classify_ms(start_delay_ms.abs());

    let at_least_good =
        |r: SyncRating| matches!(r, SyncRating::Excellent | SyncRating::Good);

    if drift == SyncRating::Excellent && start == SyncRating::Excellent {
        SyncRating::Excellent
    } else if at_least_good(drift) && at_least_good(start) {
        SyncRating::Good
    } else if drift == SyncRating::Fair {
        SyncRating::Fair
    } else {
        SyncRating::Poor
    }
}

/// Independently triggered threshold checks; one line each.
fn build_recommendations(
    avg_drift_ms: f64,
    max_drift_ms: f64,
    distribution: &DriftDistribution,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if (10.0..30.0).contains(&avg_drift_ms) {
        recommendations.push(
            "Average drift is in the 10-30ms range; timestamp-based pairing would give tighter sync"
                .to_string(),
        );
    } else if (30.0..50.0).contains(&avg_drift_ms) {
        recommendations.push(
            "Average drift is large (30-50ms); timestamp-based pairing is strongly recommended"
                .to_string(),
        );
    } else if avg_drift_ms >= 50.0 {
        recommendations.push(
            "Average drift exceeds 50ms; frame-number pairing is unreliable, use timestamp-based pairing"
                .to_string(),
        );
    }

    if max_drift_ms > 100.0 {
        recommendations.push(format!(
            "Maximum drift of {max_drift_ms:.1}ms detected; possible frame loss or timestamp discontinuity"
        ));
    }

    let total = distribution.total();
    if total > 0 {
        let good_ratio = distribution.under_10ms as f64 / total as f64;
        if good_ratio < 0.5 {
            recommendations.push(format!(
                "Only {:.1}% of sampled frames drift under 10ms; sync confidence is degraded",
                good_ratio * 100.0
            ));
        }
    }

    if recommendations.is_empty() {
        recommendations
            .push("Sync quality is good; frame-number pairing is sufficient".to_string());
    }
    recommendations
}
