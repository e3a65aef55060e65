//! Stitching step: pair extracted frames across cameras and compose them.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::stitching::{find_pairs, stitch_pairs};

/// Matches frames by global frame number and writes vertical composites.
pub struct StitchStep;

impl PipelineStep for StitchStep {
    fn name(&self) -> &str {
        "Stitch"
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.extraction.is_none() {
            return Err(StepError::precondition_failed("extraction has not run"));
        }
        if !ctx.stitched_dir().is_dir() {
            return Err(StepError::precondition_failed(format!(
                "output folder missing: {}",
                ctx.stitched_dir().display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let extraction = state.extraction.as_ref().ok_or_else(|| {
            StepError::precondition_failed("extraction has not run")
        })?;

        let pairing = find_pairs(&extraction.cam0, &extraction.cam1);
        state.summary.pairs_matched = pairing.pairs.len();
        state.summary.cam0_unmatched = pairing.cam0_unmatched;
        state.summary.cam1_unmatched = pairing.cam1_unmatched;

        if pairing.pairs.is_empty() {
            state.pairing = Some(pairing);
            return Ok(StepOutcome::Skipped("no frame pairs matched".to_string()));
        }

        let outcome = stitch_pairs(&pairing.pairs, &ctx.stitched_dir(), ctx.image_kind);
        state.summary.frames_stitched = outcome.stitched.len();
        state.summary.stitch_failures = outcome.failures;
        state.pairing = Some(pairing);
        state.stitching = Some(outcome);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.stitching.is_none() {
            return Err(StepError::invalid_output("stitch outcome not recorded"));
        }
        Ok(())
    }
}
