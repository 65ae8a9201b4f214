use crate::executor::types::{TaskId, TaskResult};

/// Output renderer plugin (observes the run, never drives it)
pub trait Renderer: Send + Sync {
    fn name(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// Render events, emitted on every task state transition
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        /// Run id of the parent list when this is a subtask list
        parent: Option<String>,
        total_tasks: usize,
    },
    TaskAdded {
        run_id: String,
        task_id: TaskId,
        title: String,
    },
    TaskEnabled {
        run_id: String,
        task_id: TaskId,
        title: String,
        enabled: bool,
    },
    TaskStart {
        run_id: String,
        task_id: TaskId,
        title: String,
    },
    TaskTitle {
        run_id: String,
        task_id: TaskId,
        title: String,
    },
    TaskOutput {
        run_id: String,
        task_id: TaskId,
        output: String,
    },
    TaskSkipped {
        run_id: String,
        task_id: TaskId,
        result: TaskResult,
    },
    TaskComplete {
        run_id: String,
        task_id: TaskId,
        result: TaskResult,
    },
    TaskFailed {
        run_id: String,
        task_id: TaskId,
        title: String,
        error: String,
        fatal: bool,
    },
    RunEnd {
        run_id: String,
        parent: Option<String>,
        success: bool,
        completed: usize,
        failed: usize,
        duration_ms: u64,
    },
}

impl RenderEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStart { run_id, .. }
            | Self::TaskAdded { run_id, .. }
            | Self::TaskEnabled { run_id, .. }
            | Self::TaskStart { run_id, .. }
            | Self::TaskTitle { run_id, .. }
            | Self::TaskOutput { run_id, .. }
            | Self::TaskSkipped { run_id, .. }
            | Self::TaskComplete { run_id, .. }
            | Self::TaskFailed { run_id, .. }
            | Self::RunEnd { run_id, .. } => run_id,
        }
    }
}
