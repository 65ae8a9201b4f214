use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TaskFailure;

use super::task::TaskId;

/// What a dispatched task ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Skipped,
    /// Recoverable failure, recorded in the run's error collector.
    Failed,
}

/// Result of a single dispatched task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task identifier
    pub task_id: TaskId,

    /// Title at completion time (tasks may retitle themselves while running)
    pub title: String,

    pub status: TaskStatus,

    /// Last output line reported by the task
    pub output: Option<String>,

    /// Reason given when the task skipped itself
    pub skip_reason: Option<String>,

    /// Error message for recoverable failures
    pub error: Option<String>,

    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.status != TaskStatus::Failed
    }
}

/// Value an execution wrapper resolves with.
///
/// A fatal failure is not an outcome: the wrapper returns it as `Err` and the
/// run is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { output: Option<String> },
    Skipped { reason: Option<String> },
    /// The failure has already been pushed into the error collector.
    Failed(TaskFailure),
}

/// Successful outcome of a task list run.
pub struct RunOutput<C> {
    pub run_id: String,

    /// The shared context, after every task has run
    pub context: Arc<C>,

    /// One entry per dispatched task, in completion order
    pub results: Vec<TaskResult>,

    /// Total execution duration in milliseconds
    pub duration_ms: u64,
}

impl<C> RunOutput<C> {
    pub fn into_context(self) -> Arc<C> {
        self.context
    }

    /// Titles of the finished tasks, in completion order.
    pub fn completion_order(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.title.as_str()).collect()
    }
}

impl<C> fmt::Debug for RunOutput<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOutput")
            .field("run_id", &self.run_id)
            .field("results", &self.results)
            .field("duration_ms", &self.duration_ms)
            .finish_non_exhaustive()
    }
}
