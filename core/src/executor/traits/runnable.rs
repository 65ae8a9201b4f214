use async_trait::async_trait;

use crate::error::TaskFailure;
use crate::executor::scope::TaskScope;
use crate::executor::types::TaskOutcome;

/// Contract between the scheduler and whatever actually runs a task.
///
/// The scheduler only asks two things of a task handle: whether it is
/// currently enabled, and to run it. Everything else (skip handling,
/// subtasks, failure classification) belongs to the implementation.
#[async_trait]
pub trait Runnable<C>: Send + Sync {
    /// Display title (unique identification is the scheduler's job)
    fn title(&self) -> &str;

    /// Evaluated against the shared context before every dispatch attempt.
    /// Must not mutate scheduling state.
    fn is_enabled(&self, _context: &C) -> bool {
        true
    }

    /// Run the task.
    ///
    /// Recoverable failures are pushed into `scope.errors()` and reported as
    /// `Ok(TaskOutcome::Failed(..))`. Returning `Err` is fatal and aborts the
    /// whole run.
    async fn run(&self, scope: TaskScope<C>) -> Result<TaskOutcome, TaskFailure>;
}
