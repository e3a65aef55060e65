//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
pub trait PipelineStep: Send + Sync {
    /// Step name, for logging and error context.
    fn name(&self) -> &str;

    /// Validate preconditions before execution.
    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Execute the step's main work, recording results in `state`.
    ///
    /// Returns `StepOutcome::Skipped` when the step determined it should
    /// not run (not an error).
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    /// Validate outputs after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Whether this step may be skipped without failing the run.
    fn is_optional(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep;

    impl PipelineStep for MockStep {
        fn name(&self) -> &str {
            "Mock"
        }

        fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut RunState) -> StepResult<StepOutcome> {
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(MockStep);
        assert_eq!(step.name(), "Mock");
        assert!(!step.is_optional());
    }
}
