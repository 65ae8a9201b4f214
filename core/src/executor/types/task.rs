use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::executor::engine::TaskList;
use crate::executor::scope::TaskScope;

/// Opaque task identity, assigned in registration order.
///
/// Ids keep increasing across dynamic insertion, so they never alias a
/// position in the task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task_{}", self.0)
    }
}

/// Scheduler-side lifecycle of a task handle.
///
/// Moves forward only: `Pending → Running → Done`, or `Pending → Done` for a
/// task that was disabled when it reached the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Done,
}

/// What a task's work function produced.
pub enum TaskOutput<C> {
    Done,
    /// Final output line, shown by renderers and kept in the result.
    Output(String),
    /// A nested task list, run to completion against the same context.
    Subtasks(TaskList<C>),
}

impl<C> From<()> for TaskOutput<C> {
    fn from(_: ()) -> Self {
        Self::Done
    }
}

impl<C> From<String> for TaskOutput<C> {
    fn from(output: String) -> Self {
        Self::Output(output)
    }
}

impl<C> From<TaskList<C>> for TaskOutput<C> {
    fn from(list: TaskList<C>) -> Self {
        Self::Subtasks(list)
    }
}

pub type EnabledFn<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;
pub type SkipFn<C> = Arc<dyn Fn(&C) -> Option<String> + Send + Sync>;
pub type WorkFn<C> =
    Arc<dyn Fn(TaskScope<C>) -> BoxFuture<'static, anyhow::Result<TaskOutput<C>>> + Send + Sync>;

/// A unit of work registered with a [`TaskList`].
///
/// ```ignore
/// let task = Task::new("Install dependencies", |scope: TaskScope<Ctx>| async move {
///     scope.set_output("resolving");
///     Ok(TaskOutput::Done)
/// })
/// .enabled(|ctx: &Ctx| ctx.online);
/// ```
pub struct Task<C> {
    pub(crate) title: String,
    pub(crate) enabled: Option<EnabledFn<C>>,
    pub(crate) skip: Option<SkipFn<C>>,
    pub(crate) work: WorkFn<C>,
    pub(crate) exit_on_error: Option<bool>,
}

impl<C: Send + Sync + 'static> Task<C> {
    pub fn new<F, Fut>(title: impl Into<String>, work: F) -> Self
    where
        F: Fn(TaskScope<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutput<C>>> + Send + 'static,
    {
        Self {
            title: title.into(),
            enabled: None,
            skip: None,
            work: Arc::new(move |scope| work(scope).boxed()),
            exit_on_error: None,
        }
    }

    /// Only dispatch the task while `predicate` holds for the context.
    ///
    /// Re-evaluated before every dispatch attempt until the task starts.
    pub fn enabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(predicate));
        self
    }

    /// Skip the task at start time when `predicate` returns a reason.
    pub fn skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&C) -> Option<String> + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    /// Override the list-level `exit_on_error` for this task only.
    pub fn exit_on_error(mut self, exit_on_error: bool) -> Self {
        self.exit_on_error = Some(exit_on_error);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title)
            .field("has_enabled", &self.enabled.is_some())
            .field("has_skip", &self.skip.is_some())
            .field("exit_on_error", &self.exit_on_error)
            .finish()
    }
}
