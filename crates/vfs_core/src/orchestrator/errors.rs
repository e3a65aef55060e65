//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Run → Step → Operation → Detail

use std::io;

use thiserror::Error;

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled.
    #[error("Run '{run_name}' was cancelled")]
    Cancelled { run_name: String },

    /// The operator declined to continue at a confirmation point.
    #[error("Run '{run_name}' aborted at step '{step_name}': {reason}")]
    Aborted {
        run_name: String,
        step_name: String,
        reason: String,
    },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(run_name: impl Into<String>) -> Self {
        Self::Cancelled {
            run_name: run_name.into(),
        }
    }

    /// Create an operator-abort error.
    pub fn aborted(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Aborted {
            run_name: run_name.into(),
            step_name: step_name.into(),
            reason: reason.into(),
        }
    }

    /// True when the run ended by operator choice, not by failure.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Self::Aborted { .. } | Self::Cancelled { .. })
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// The operator declined to continue.
    #[error("Aborted: {0}")]
    Aborted(String),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create an operator-abort error.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted(message.into())
    }

    /// Create an I/O error with context.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
