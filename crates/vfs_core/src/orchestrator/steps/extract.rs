//! Extraction step: run the sampled frame extraction over the worker pool.

use std::sync::Arc;
use std::time::Duration;

use crate::extraction::{build_tasks, Scheduler};
use crate::models::CameraId;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Builds per-segment tasks and runs them on the bounded worker pool.
pub struct ExtractStep;

impl PipelineStep for ExtractStep {
    fn name(&self) -> &str {
        "Extract"
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.catalog.is_none() {
            return Err(StepError::precondition_failed("discovery has not run"));
        }
        for camera in CameraId::ALL {
            let dir = ctx.camera_frames_dir(camera);
            if !dir.is_dir() {
                return Err(StepError::precondition_failed(format!(
                    "output folder missing: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let catalog = state.catalog.as_ref().ok_or_else(|| {
            StepError::precondition_failed("discovery has not run")
        })?;

        let tasks = build_tasks(
            catalog,
            ctx.settings.extraction.sampling_interval,
            &ctx.camera_frames_dir(CameraId::Cam0),
            &ctx.camera_frames_dir(CameraId::Cam1),
            ctx.image_kind,
        );

        let scheduler = Scheduler::new(
            ctx.settings.extraction.workers,
            Duration::from_secs(ctx.settings.extraction.task_timeout_secs),
            ctx.cancel.clone(),
        );
        let outcome = scheduler
            .extract_all(tasks, Arc::clone(&ctx.opener))
            .map_err(|e| StepError::precondition_failed(e.to_string()))?;

        state.summary.cam0_extracted = outcome.cam0.len();
        state.summary.cam1_extracted = outcome.cam1.len();
        state.summary.failed_tasks = outcome.failed_tasks;
        state.extraction = Some(outcome);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        let outcome = state
            .extraction
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("extraction outcome not recorded"))?;
        // A cancelled run legitimately carries partial or empty results; the
        // runner reports the cancellation at the next step boundary.
        if !ctx.cancel.is_cancelled() && outcome.cam0.is_empty() && outcome.cam1.is_empty() {
            return Err(StepError::invalid_output("no frames were extracted"));
        }
        Ok(())
    }
}
