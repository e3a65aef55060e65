//! Discovery step: catalog segments and sanity-check the pairing.

use tracing::{info, warn};

use crate::discovery::{self, DiscoveryError};
use crate::models::CameraId;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::sampling::expected_samples;

/// Scans the input directory, probes segments and records the catalog.
///
/// Aborts the run when a camera has no segments, or when the cross-camera
/// frame count mismatch exceeds the configured threshold and the operator
/// declines to continue.
pub struct DiscoverStep;

impl PipelineStep for DiscoverStep {
    fn name(&self) -> &str {
        "Discover"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if ctx.settings.paths.input_dir.is_empty() {
            return Err(StepError::invalid_input("input_dir is empty"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let catalog = discovery::discover(
            &ctx.input_dir(),
            &ctx.settings.paths.cam0_pattern,
            &ctx.settings.paths.cam1_pattern,
            ctx.prober.as_ref(),
        )
        .map_err(map_discovery_error)?;

        for camera in CameraId::ALL {
            if catalog.for_camera(camera).is_empty() {
                return Err(StepError::precondition_failed(format!(
                    "no {camera} segments found in {}",
                    ctx.settings.paths.input_dir
                )));
            }
        }

        for warning in discovery::validate_pairing(&catalog) {
            warn!("{warning}");
        }

        let cam0_total = catalog.total_frames(CameraId::Cam0);
        let cam1_total = catalog.total_frames(CameraId::Cam1);
        info!(
            "Discovered cam0: {} segments / {} frames, cam1: {} segments / {} frames",
            catalog.cam0.len(),
            cam0_total,
            catalog.cam1.len(),
            cam1_total
        );

        let check = discovery::frame_count_difference(
            cam0_total,
            cam1_total,
            ctx.settings.extraction.frame_count_threshold_percent,
        );
        if check.exceeds_threshold {
            let message = format!(
                "Frame counts differ by {} frames ({:.1}%), above the {:.1}% threshold",
                check.absolute_difference,
                check.difference_percent,
                ctx.settings.extraction.frame_count_threshold_percent
            );
            match &ctx.confirm {
                Some(confirm) if !confirm(&message) => {
                    return Err(StepError::aborted(message));
                }
                Some(_) => info!("Continuing past frame count mismatch on operator confirmation"),
                None => warn!("{message}; continuing"),
            }
        }

        let interval = ctx.settings.extraction.sampling_interval;
        state.summary.cam0_segments = catalog.cam0.len();
        state.summary.cam1_segments = catalog.cam1.len();
        state.summary.cam0_total_frames = cam0_total;
        state.summary.cam1_total_frames = cam1_total;
        state.summary.cam0_expected_samples = expected_samples(cam0_total, interval);
        state.summary.cam1_expected_samples = expected_samples(cam1_total, interval);
        state.catalog = Some(catalog);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.catalog.is_none() {
            return Err(StepError::invalid_output("segment catalog not recorded"));
        }
        Ok(())
    }
}

fn map_discovery_error(error: DiscoveryError) -> StepError {
    match error {
        DiscoveryError::ReadDir { source, .. } => StepError::io_error("read input dir", source),
        other => StepError::invalid_input(other.to_string()),
    }
}
