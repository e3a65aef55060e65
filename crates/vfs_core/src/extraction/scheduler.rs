//! Bounded worker pool running extraction tasks.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use super::cancel::CancelToken;
use super::task::{run_segment_task, ExtractionTask};
use crate::media::FrameSourceOpener;
use crate::models::{CameraId, ExtractedFrame};

/// Errors that abort the extraction phase as a whole.
///
/// Individual task failures never surface here; the only fatal condition is
/// having nothing to schedule for a camera.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No extraction tasks could be scheduled for {camera}")]
    NoTasks { camera: CameraId },
}

/// Merged results of an extraction run.
///
/// Both per-camera lists are sorted ascending by global frame number; no
/// consumer ever observes task-completion order.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub cam0: Vec<ExtractedFrame>,
    pub cam1: Vec<ExtractedFrame>,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl ExtractionOutcome {
    pub fn for_camera(&self, camera: CameraId) -> &[ExtractedFrame] {
        match camera {
            CameraId::Cam0 => &self.cam0,
            CameraId::Cam1 => &self.cam1,
        }
    }
}

/// One worker's verdict on one task.
enum TaskReport {
    Done(CameraId, Vec<ExtractedFrame>),
    /// Popped under cancellation without running.
    NotRun,
}

/// Dispatches extraction tasks to a bounded pool of worker threads and
/// merges their results deterministically.
pub struct Scheduler {
    workers: usize,
    task_timeout: Duration,
    cancel: CancelToken,
}

impl Scheduler {
    /// `workers == 0` selects the machine's available parallelism.
    pub fn new(workers: usize, task_timeout: Duration, cancel: CancelToken) -> Self {
        let workers = if workers == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            workers
        };
        Self {
            workers,
            task_timeout,
            cancel,
        }
    }

    /// Run all tasks and return the per-camera frame sets.
    ///
    /// Tasks execute in arbitrary order on the pool; each owns its segment
    /// and offset, so there is no shared mutable state between them. A task
    /// that fails contributes nothing and the batch proceeds. A task that
    /// stalls past the timeout is abandoned individually - its worker stays
    /// stuck with it, so the pool is refilled and every other task still
    /// runs. Cancellation drains the queue without running the remaining
    /// tasks; results already collected are retained.
    pub fn extract_all(
        &self,
        tasks: Vec<ExtractionTask>,
        opener: Arc<dyn FrameSourceOpener>,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        for camera in CameraId::ALL {
            if !tasks.iter().any(|t| t.camera_id() == camera) {
                return Err(ExtractionError::NoTasks { camera });
            }
        }

        let total_tasks = tasks.len();
        let pool_size = self.workers.min(total_tasks);
        info!(
            "Dispatching {} extraction tasks to {} workers",
            total_tasks, pool_size
        );

        let queue = Arc::new(Mutex::new(tasks.into_iter().collect::<VecDeque<_>>()));
        let (tx, rx) = mpsc::channel::<TaskReport>();

        let mut handles = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            handles.push(spawn_worker(
                Arc::clone(&queue),
                Arc::clone(&opener),
                self.cancel.clone(),
                tx.clone(),
            ));
        }

        // Every task is settled exactly once: completed, not run, or
        // abandoned as stalled.
        let mut outcome = ExtractionOutcome::default();
        let mut settled = 0usize;
        let mut stalled_tasks = 0usize;
        while settled < total_tasks {
            match rx.recv_timeout(self.task_timeout) {
                Ok(TaskReport::Done(camera, frames)) => {
                    settled += 1;
                    outcome.completed_tasks += 1;
                    match camera {
                        CameraId::Cam0 => outcome.cam0.extend(frames),
                        CameraId::Cam1 => outcome.cam1.extend(frames),
                    }
                }
                Ok(TaskReport::NotRun) => settled += 1,
                Err(RecvTimeoutError::Timeout) => {
                    settled += 1;
                    stalled_tasks += 1;
                    warn!(
                        "No task finished within {:?}; abandoning one stalled task",
                        self.task_timeout
                    );
                    // The stalled worker is stuck with its task; refill the
                    // pool so the queued tasks still drain.
                    if !queue.lock().is_empty() {
                        handles.push(spawn_worker(
                            Arc::clone(&queue),
                            Arc::clone(&opener),
                            self.cancel.clone(),
                            tx.clone(),
                        ));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        drop(tx);

        outcome.failed_tasks = total_tasks - outcome.completed_tasks;
        if self.cancel.is_cancelled() {
            warn!(
                "Extraction cancelled; keeping {} completed task results",
                outcome.completed_tasks
            );
        }

        // A stalled worker may never return; only join on clean shutdown.
        if stalled_tasks == 0 {
            for handle in handles {
                let _ = handle.join();
            }
        }

        // Mandatory: the final ordering is by global frame number, never by
        // completion order.
        outcome.cam0.sort_by_key(|f| f.global_frame_number);
        outcome.cam1.sort_by_key(|f| f.global_frame_number);

        info!(
            "Extraction complete: cam0={}, cam1={}, failed tasks={}",
            outcome.cam0.len(),
            outcome.cam1.len(),
            outcome.failed_tasks
        );
        Ok(outcome)
    }
}

fn spawn_worker(
    queue: Arc<Mutex<VecDeque<ExtractionTask>>>,
    opener: Arc<dyn FrameSourceOpener>,
    cancel: CancelToken,
    tx: mpsc::Sender<TaskReport>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        let Some(task) = queue.lock().pop_front() else {
            break;
        };
        if cancel.is_cancelled() {
            if tx.send(TaskReport::NotRun).is_err() {
                break;
            }
            continue;
        }
        let camera = task.camera_id();
        let frames = run_segment_task(&task, opener.as_ref());
        if tx.send(TaskReport::Done(camera, frames)).is_err() {
            break;
        }
    })
}
