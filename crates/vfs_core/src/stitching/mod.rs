//! Frame pairing and vertical stitching.
//!
//! Pairs extracted frames across cameras by exact global frame number (no
//! tolerance matching) and composes each pair vertically. Unmatched frames
//! and failed compositions are counted, never fatal.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::media::{compose_vertical, load_frame, persist_frame, ImageKind};
use crate::models::{ExtractedFrame, FramePair, StitchedFrame};

/// Pairing outcome: matched pairs plus the one-sided leftovers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingResult {
    /// Pairs ordered ascending by global frame number.
    pub pairs: Vec<FramePair>,
    pub cam0_unmatched: usize,
    pub cam1_unmatched: usize,
}

/// Match frames across cameras by global frame number.
///
/// Input order is not assumed; a pair exists iff both cameras produced that
/// exact global number. Re-running on the same inputs yields identical
/// output, order included.
pub fn find_pairs(cam0: &[ExtractedFrame], cam1: &[ExtractedFrame]) -> PairingResult {
    let cam0_map: BTreeMap<u64, &ExtractedFrame> =
        cam0.iter().map(|f| (f.global_frame_number, f)).collect();
    let cam1_map: BTreeMap<u64, &ExtractedFrame> =
        cam1.iter().map(|f| (f.global_frame_number, f)).collect();

    let pairs: Vec<FramePair> = cam0_map
        .iter()
        .filter_map(|(number, frame)| {
            cam1_map.get(number).map(|other| FramePair {
                global_frame_number: *number,
                cam0: (*frame).clone(),
                cam1: (*other).clone(),
            })
        })
        .collect();

    let cam0_unmatched = cam0_map.len() - pairs.len();
    let cam1_unmatched = cam1_map.len() - pairs.len();
    if cam0_unmatched > 0 {
        warn!("{cam0_unmatched} cam0 frames have no matching cam1 frame");
    }
    if cam1_unmatched > 0 {
        warn!("{cam1_unmatched} cam1 frames have no matching cam0 frame");
    }

    PairingResult {
        pairs,
        cam0_unmatched,
        cam1_unmatched,
    }
}

/// Stitching outcome: persisted composites plus the failure count.
#[derive(Debug, Clone, Default)]
pub struct StitchOutcome {
    pub stitched: Vec<StitchedFrame>,
    pub failures: usize,
}

/// Compose every pair vertically (cam0 on top) and persist the result.
///
/// A pair whose frames cannot be loaded, composed or written is logged and
/// excluded; the remaining pairs continue.
pub fn stitch_pairs(pairs: &[FramePair], output_dir: &Path, kind: ImageKind) -> StitchOutcome {
    let mut outcome = StitchOutcome::default();

    for pair in pairs {
        match stitch_one(pair, output_dir, kind) {
            Ok(frame) => outcome.stitched.push(frame),
            Err(message) => {
                error!(
                    "Failed to stitch frame {}: {}",
                    pair.global_frame_number, message
                );
                outcome.failures += 1;
            }
        }
    }

    info!(
        "Stitched {} frames ({} failures)",
        outcome.stitched.len(),
        outcome.failures
    );
    outcome
}

fn stitch_one(pair: &FramePair, output_dir: &Path, kind: ImageKind) -> Result<StitchedFrame, String> {
    let top = load_frame(&pair.cam0.path).map_err(|e| e.to_string())?;
    let bottom = load_frame(&pair.cam1.path).map_err(|e| e.to_string())?;

    let composite = compose_vertical(&top, &bottom);
    let path = persist_frame(&composite, output_dir, pair.global_frame_number, kind)
        .map_err(|e| e.to_string())?;

    Ok(StitchedFrame {
        global_frame_number: pair.global_frame_number,
        path,
    })
}
