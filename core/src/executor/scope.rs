use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{SchedulerError, TaskFailure};
use crate::executor::collector::ErrorCollector;
use crate::executor::dynamic::DynamicTasks;
use crate::executor::traits::{RenderEvent, Renderer};
use crate::executor::types::{Task, TaskId};

#[derive(Debug, Default)]
struct ScopeState {
    title: String,
    output: Option<String>,
    skipped: Option<String>,
}

/// Everything a running task can see and touch.
///
/// Handed to the execution wrapper by the scheduler and passed on to the
/// task's work function. Clones share state.
pub struct TaskScope<C> {
    context: Arc<C>,
    task_id: TaskId,
    run_id: Arc<str>,
    errors: ErrorCollector,
    dynamic: DynamicTasks<C>,
    renderer: Option<Arc<dyn Renderer>>,
    exit_on_error: Option<bool>,
    show_subtasks: bool,
    state: Arc<Mutex<ScopeState>>,
}

impl<C> Clone for TaskScope<C> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            task_id: self.task_id,
            run_id: Arc::clone(&self.run_id),
            errors: self.errors.clone(),
            dynamic: self.dynamic.clone(),
            renderer: self.renderer.clone(),
            exit_on_error: self.exit_on_error,
            show_subtasks: self.show_subtasks,
            state: Arc::clone(&self.state),
        }
    }
}

pub(crate) struct ScopeParts<C> {
    pub context: Arc<C>,
    pub task_id: TaskId,
    pub title: String,
    pub run_id: Arc<str>,
    pub errors: ErrorCollector,
    pub dynamic: DynamicTasks<C>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub exit_on_error: Option<bool>,
    pub show_subtasks: bool,
}

impl<C: Send + Sync + 'static> TaskScope<C> {
    pub(crate) fn new(parts: ScopeParts<C>) -> Self {
        Self {
            context: parts.context,
            task_id: parts.task_id,
            run_id: parts.run_id,
            errors: parts.errors,
            dynamic: parts.dynamic,
            renderer: parts.renderer,
            exit_on_error: parts.exit_on_error,
            show_subtasks: parts.show_subtasks,
            state: Arc::new(Mutex::new(ScopeState {
                title: parts.title,
                ..ScopeState::default()
            })),
        }
    }

    /// The shared run context. No synchronisation is added on top of
    /// whatever `C` provides.
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_arc(&self) -> Arc<C> {
        Arc::clone(&self.context)
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.lock().title = title.clone();
        self.emit(RenderEvent::TaskTitle {
            run_id: self.run_id.to_string(),
            task_id: self.task_id,
            title,
        });
    }

    /// Report a line of progress output for this task.
    pub fn set_output(&self, output: impl Into<String>) {
        let output = output.into();
        self.lock().output = Some(output.clone());
        self.emit(RenderEvent::TaskOutput {
            run_id: self.run_id.to_string(),
            task_id: self.task_id,
            output,
        });
    }

    pub fn output(&self) -> Option<String> {
        self.lock().output.clone()
    }

    /// Mark the task as skipped. Takes effect when the work function returns
    /// successfully.
    pub fn skip(&self, reason: impl Into<String>) {
        self.lock().skipped = Some(reason.into());
    }

    pub fn skip_reason(&self) -> Option<String> {
        self.lock().skipped.clone()
    }

    /// Record a recoverable failure without failing the task.
    pub fn report(&self, failure: TaskFailure) {
        self.errors.push(failure);
    }

    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }

    /// Add a task to the list this task belongs to, while it is running.
    pub fn add_task(&self, task: Task<C>) -> Result<(), SchedulerError> {
        self.dynamic.add(task)
    }

    pub fn dynamic(&self) -> &DynamicTasks<C> {
        &self.dynamic
    }

    /// List-level `exit_on_error`, forwarded untouched by the scheduler.
    pub fn exit_on_error(&self) -> Option<bool> {
        self.exit_on_error
    }

    pub(crate) fn show_subtasks(&self) -> bool {
        self.show_subtasks
    }

    pub(crate) fn renderer(&self) -> Option<Arc<dyn Renderer>> {
        self.renderer.clone()
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
