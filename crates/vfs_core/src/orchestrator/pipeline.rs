//! Pipeline runner that executes steps in sequence.

use tracing::{debug, error, info, warn};

use super::errors::{PipelineError, PipelineResult, StepError};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};

/// Pipeline that runs a sequence of steps.
///
/// Steps execute in order with validation before and after each one.
/// Cancellation is honored at step boundaries; within a step it is up to
/// the step itself (the extraction pool shares the same token).
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline with the given context and state.
    ///
    /// For each step: check cancellation, `validate_input`, `execute`, then
    /// `validate_output` when it succeeded. An operator abort from a step is
    /// surfaced as `PipelineError::Aborted` rather than a failure. A failure
    /// in an optional step is logged and recorded as a skip; the run goes on.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult::default();

        for step in &self.steps {
            if ctx.cancel.is_cancelled() {
                warn!("Cancelled before step '{}'", step.name());
                return Err(PipelineError::cancelled(&ctx.run_name));
            }

            let step_name = step.name();
            info!("=== {} ===", step_name);

            match self.run_step(step.as_ref(), ctx, state) {
                Ok(StepOutcome::Success) => {
                    result.steps_completed.push(step_name.to_string());
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    info!("{} skipped: {}", step_name, reason);
                    result.steps_skipped.push(step_name.to_string());
                }
                Err(StepError::Aborted(reason)) => {
                    return Err(PipelineError::aborted(&ctx.run_name, step_name, reason));
                }
                Err(e) if step.is_optional() => {
                    warn!("Optional step '{}' failed, continuing: {}", step_name, e);
                    result.steps_skipped.push(step_name.to_string());
                }
                Err(e) => {
                    error!("'{}' failed: {}", step_name, e);
                    return Err(PipelineError::step_failed(&ctx.run_name, step_name, e));
                }
            }
        }

        info!("Pipeline completed");
        Ok(result)
    }

    fn run_step(
        &self,
        step: &dyn PipelineStep,
        ctx: &Context,
        state: &mut RunState,
    ) -> Result<StepOutcome, StepError> {
        debug!("Validating input for '{}'", step.name());
        step.validate_input(ctx, state)?;

        let outcome = step.execute(ctx, state)?;

        if outcome == StepOutcome::Success {
            debug!("Validating output for '{}'", step.name());
            step.validate_output(ctx, state)?;
        }
        Ok(outcome)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }
}
