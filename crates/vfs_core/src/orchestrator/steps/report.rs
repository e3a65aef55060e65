//! Report step: render and persist the run report.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};
use crate::report::RunReport;

/// Writes the plain-text run report into the output folder.
pub struct ReportStep;

impl PipelineStep for ReportStep {
    fn name(&self) -> &str {
        "Report"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        if !ctx.output_dir().is_dir() {
            return Err(StepError::precondition_failed(format!(
                "output folder missing: {}",
                ctx.output_dir().display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let report = RunReport {
            summary: state.summary.clone(),
            sync: state.sync.clone(),
        };
        let path = report
            .write(&ctx.output_dir())
            .map_err(|e| StepError::io_error("write report", e))?;
        state.report_path = Some(path);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        match &state.report_path {
            Some(path) if path.is_file() => Ok(()),
            _ => Err(StepError::invalid_output("report file not written")),
        }
    }
}
