//! Parallel frame extraction.
//!
//! The (segment x camera) matrix is partitioned into independent
//! [`ExtractionTask`]s that a bounded worker pool executes in any order.
//! Global frame numbering stays correct because every task carries its own
//! precomputed offset and the sampling predicate is pure; the scheduler's
//! final sort makes the output independent of completion order.

mod cancel;
mod scheduler;
mod task;

pub use cancel::CancelToken;
pub use scheduler::{ExtractionError, ExtractionOutcome, Scheduler};
pub use task::{build_tasks, run_segment_task, ExtractionTask};
