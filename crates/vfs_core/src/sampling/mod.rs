//! Global-index frame sampling.
//!
//! Maps local frame positions inside a segment to global frame numbers and
//! decides which global positions get extracted. All functions are pure -
//! no I/O, no accumulated state - so the predicate gives identical answers
//! inside every parallel worker regardless of traversal order.

use std::collections::BTreeMap;

use crate::models::VideoSegment;

/// Whether the frame at `global_frame_number` (1-indexed) is a sampling
/// point for the given interval.
///
/// Sampling points form the arithmetic progression 1, 1+N, 1+2N, ... for
/// interval N. Frame numbers below 1 are never sampled.
pub fn should_sample(global_frame_number: u64, interval: u32) -> bool {
    if global_frame_number < 1 {
        return false;
    }
    (global_frame_number - 1) % u64::from(interval) == 0
}

/// Per-segment global frame offsets for one camera.
///
/// Segments are ordered ascending by segment number; each offset is the sum
/// of the frame counts of all segments strictly before it (exclusive prefix
/// sum). Gaps in segment numbering are permitted and skipped - a missing
/// segment simply leaves a hole in the observed global sequence.
///
/// The global number of the i-th local frame (1-indexed) of segment k is
/// `offset(k) + i`.
pub fn compute_offsets(segments: &[VideoSegment]) -> BTreeMap<u32, u64> {
    let mut ordered: Vec<&VideoSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.segment_number);

    let mut offsets = BTreeMap::new();
    let mut running = 0u64;
    for segment in ordered {
        offsets.insert(segment.segment_number, running);
        running += segment.frame_count;
    }
    offsets
}

/// Number of sampling points in a stream of `total_frames` frames.
pub fn expected_samples(total_frames: u64, interval: u32) -> u64 {
    if total_frames == 0 {
        return 0;
    }
    // Points 1, 1+N, ... <= total_frames.
    (total_frames - 1) / u64::from(interval) + 1
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::models::CameraId;

    fn segment(number: u32, frame_count: u64) -> VideoSegment {
        VideoSegment {
            camera_id: CameraId::Cam0,
            segment_number: number,
            path: PathBuf::from(format!("seg_{number}.mp4")),
            frame_count,
        }
    }

    #[test]
    fn sampling_starts_at_one_and_steps_by_interval() {
        for interval in [1u32, 2, 7, 100] {
            let accepted: Vec<u64> = (1..=1000).filter(|&g| should_sample(g, interval)).collect();
            assert_eq!(accepted[0], 1);
            for pair in accepted.windows(2) {
                assert_eq!(pair[1] - pair[0], u64::from(interval));
            }
        }
    }

    #[test]
    fn sampling_matches_arithmetic_progression() {
        let interval = 100;
        let accepted: Vec<u64> = (1..=350).filter(|&g| should_sample(g, interval)).collect();
        assert_eq!(accepted, vec![1, 101, 201, 301]);
    }

    #[test]
    fn frame_zero_is_never_sampled() {
        assert!(!should_sample(0, 1));
        assert!(!should_sample(0, 100));
    }

    #[test]
    fn offsets_are_exclusive_prefix_sums() {
        let segments = vec![segment(1, 100), segment(2, 150), segment(3, 80)];
        let offsets = compute_offsets(&segments);
        assert_eq!(offsets[&1], 0);
        assert_eq!(offsets[&2], 100);
        assert_eq!(offsets[&3], 250);
    }

    #[test]
    fn offsets_are_independent_of_input_order() {
        let forward = vec![segment(1, 100), segment(2, 150), segment(3, 80)];
        let shuffled = vec![segment(3, 80), segment(1, 100), segment(2, 150)];
        assert_eq!(compute_offsets(&forward), compute_offsets(&shuffled));
    }

    #[test]
    fn offsets_skip_gaps_in_segment_numbers() {
        let segments = vec![segment(1, 100), segment(5, 60)];
        let offsets = compute_offsets(&segments);
        assert_eq!(offsets[&1], 0);
        // The gap does not affect the arithmetic: segment 5 follows segment 1.
        assert_eq!(offsets[&5], 100);
        assert_eq!(offsets.len(), 2);
    }

    #[test]
    fn expected_samples_counts_progression_members() {
        assert_eq!(expected_samples(300, 100), 3); // 1, 101, 201
        assert_eq!(expected_samples(301, 100), 4); // plus 301
        assert_eq!(expected_samples(1, 100), 1);
        assert_eq!(expected_samples(0, 100), 0);
        assert_eq!(expected_samples(10, 1), 10);
    }
}
