/// Error types surfaced by the executor, re-exported next to the types they
/// describe.
pub use crate::error::{RunError, SchedulerError, TaskFailure};
