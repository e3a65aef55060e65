//! Optional sync-check step running the timestamp drift analysis.

use tracing::{info, warn};

use crate::analysis::{load_camera_series, SyncAnalyzer};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RunState, StepOutcome};

/// Runs the drift analysis over the timestamp sidecar logs.
///
/// Purely advisory: missing or unusable logs skip the step, they never
/// fail the run.
pub struct SyncCheckStep;

impl PipelineStep for SyncCheckStep {
    fn name(&self) -> &str {
        "Sync check"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.catalog.is_none() {
            return Err(StepError::precondition_failed("discovery has not run"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        if !ctx.settings.analysis.enabled {
            return Ok(StepOutcome::Skipped("disabled in config".to_string()));
        }
        let catalog = state.catalog.as_ref().ok_or_else(|| {
            StepError::precondition_failed("discovery has not run")
        })?;

        let cam0_series = load_camera_series(&catalog.cam0);
        let cam1_series = load_camera_series(&catalog.cam1);

        let analyzer = SyncAnalyzer::new(
            ctx.settings.analysis.sync_threshold_ms,
            ctx.settings.analysis.sample_points,
        );
        match analyzer.analyze(&cam0_series, &cam1_series) {
            Ok(analysis) => {
                info!(
                    "Sync rating: {} (avg drift {:.1} ms, max {:.1} ms)",
                    analysis.rating, analysis.avg_drift_ms, analysis.max_drift_ms
                );
                for recommendation in &analysis.recommendations {
                    info!("  {recommendation}");
                }
                state.sync = Some(analysis);
                Ok(StepOutcome::Success)
            }
            Err(e) => {
                warn!("Sync analysis unavailable: {e}");
                Ok(StepOutcome::Skipped(e.to_string()))
            }
        }
    }

    fn validate_output(&self, _ctx: &Context, state: &RunState) -> StepResult<()> {
        if state.sync.is_none() {
            return Err(StepError::invalid_output("sync analysis not recorded"));
        }
        Ok(())
    }
}
