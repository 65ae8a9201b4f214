use thiserror::Error;

use crate::executor::types::TaskId;

/// Errors raised by the scheduler itself, independent of any task outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Dynamic insertion outside of an active run.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed registration input, surfaced before any run begins.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SchedulerError {
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// A single failure record produced by a task.
///
/// Recoverable failures are appended to the run's
/// [`ErrorCollector`](crate::executor::ErrorCollector); a fatal failure is
/// returned directly by the wrapper and ends the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{title}: {message}")]
pub struct TaskFailure {
    /// Task that failed. `None` for failures reported from outside a task.
    pub task_id: Option<TaskId>,
    pub title: String,
    pub message: String,
}

impl TaskFailure {
    pub fn new(task_id: Option<TaskId>, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Build a failure from an `anyhow` error, keeping the whole context chain.
    pub fn from_anyhow(task_id: Option<TaskId>, title: &str, err: &anyhow::Error) -> Self {
        Self::new(task_id, title, format!("{err:#}"))
    }
}
