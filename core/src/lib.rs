//! Ordered task lists with a concurrency limit, dynamic insertion and
//! recoverable error aggregation.

pub mod config;
pub mod error;
pub mod executor;

pub use error::{CliError, RunError, SchedulerError, TaskFailure};
pub use executor::{
    Concurrency, DynamicTasks, ListOptions, ProgressRenderer, RenderEvent, Renderer, RunOutput,
    Runnable, Task, TaskId, TaskList, TaskOutcome, TaskOutput, TaskResult, TaskScope, TaskState,
    TaskStatus,
};
