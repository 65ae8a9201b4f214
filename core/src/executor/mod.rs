//! Task list executor
//!
//! Runs an ordered list of tasks with a bounded concurrency degree, tracks
//! each task's lifecycle, collects recoverable failures and accepts new tasks
//! while a run is in progress.
//!
//! # Architecture
//!
//! ```text
//! TaskList::add(Task)            ──► Vec<Arc<dyn Runnable>>
//!   ↓
//! TaskList::run(context)
//!   ↓
//! TaskTable::register()          Pending (ids in registration order)
//!   ↓
//! TaskTable::dispatch()          Pending → Running, capped by Concurrency
//!   ↓                            (disabled tasks: Pending → Done)
//! JoinSet::spawn(Runnable::run)  TaskWrapper: skip / work / subtasks
//!   ↓
//! TaskTable::complete()          Running → Done, then dispatch again
//!   ↓
//! DynamicTasks::try_seal()       no queued insertions → sealed
//!   ↓
//! RunOutput | RunError::Aggregate | RunError::Fatal
//! ```
//!
//! Scheduling state lives in a single run-loop future and is only touched
//! between its await points, so each dispatch pass is atomic with respect to
//! task completions and insertions.

mod collector;
mod dynamic;
mod engine;
mod progress;
mod scheduler;
mod scope;
pub mod traits;
pub mod types;
mod wrapper;

pub use collector::ErrorCollector;
pub use dynamic::DynamicTasks;
pub use engine::TaskList;
pub use progress::ProgressRenderer;
pub use scheduler::{Dispatch, TaskTable};
pub use scope::TaskScope;
pub use traits::{RenderEvent, Renderer, Runnable};
pub use types::{
    Concurrency, ListOptions, RunOutput, Task, TaskId, TaskOutcome, TaskOutput, TaskResult,
    TaskState, TaskStatus,
};
pub use wrapper::TaskWrapper;
