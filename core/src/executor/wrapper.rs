use async_trait::async_trait;
use tracing::debug;

use crate::error::{RunError, TaskFailure};
use crate::executor::engine::TaskList;
use crate::executor::scope::TaskScope;
use crate::executor::traits::Runnable;
use crate::executor::types::{Task, TaskOutcome, TaskOutput};

/// Default execution wrapper for [`Task`]s.
///
/// Evaluates the skip predicate, runs the work function, runs nested subtask
/// lists and decides whether a failure is fatal. The effective
/// `exit_on_error` is the task's own override, else the list option, else
/// `true`.
pub struct TaskWrapper<C> {
    task: Task<C>,
}

impl<C: Send + Sync + 'static> TaskWrapper<C> {
    pub fn new(task: Task<C>) -> Self {
        Self { task }
    }

    fn exits_on_error(&self, scope: &TaskScope<C>) -> bool {
        self.task
            .exit_on_error
            .or(scope.exit_on_error())
            .unwrap_or(true)
    }

    fn classify(
        &self,
        failure: TaskFailure,
        scope: &TaskScope<C>,
    ) -> Result<TaskOutcome, TaskFailure> {
        if self.exits_on_error(scope) {
            debug!(task_id = %scope.task_id(), "TaskWrapper: fatal failure");
            Err(failure)
        } else {
            debug!(task_id = %scope.task_id(), "TaskWrapper: recoverable failure");
            scope.report(failure.clone());
            Ok(TaskOutcome::Failed(failure))
        }
    }

    async fn run_subtasks(
        &self,
        mut list: TaskList<C>,
        scope: &TaskScope<C>,
    ) -> Result<TaskOutcome, TaskFailure> {
        if list.options().exit_on_error.is_none() {
            list.options_mut().exit_on_error = scope.exit_on_error();
        }
        if scope.show_subtasks() && list.renderer().is_none() {
            if let Some(renderer) = scope.renderer() {
                list.set_renderer(renderer);
            }
        }
        list.set_parent(scope.run_id());
        debug!(task_id = %scope.task_id(), subtasks = list.len(), "TaskWrapper: running subtasks");

        match list.run_shared(scope.context_arc()).await {
            Ok(_) => Ok(TaskOutcome::Completed {
                output: scope.output(),
            }),
            Err(RunError::Aggregate { errors, .. }) => {
                let summary = TaskFailure::new(
                    Some(scope.task_id()),
                    scope.title(),
                    format!("{} subtask(s) failed", errors.len()),
                );
                scope.errors().extend(errors);
                Ok(TaskOutcome::Failed(summary))
            }
            // Already rendered by the nested list, so no output line here.
            Err(RunError::Fatal { failure, .. }) => self.classify(failure, scope),
        }
    }
}

#[async_trait]
impl<C: Send + Sync + 'static> Runnable<C> for TaskWrapper<C> {
    fn title(&self) -> &str {
        &self.task.title
    }

    fn is_enabled(&self, context: &C) -> bool {
        self.task
            .enabled
            .as_ref()
            .map_or(true, |predicate| predicate(context))
    }

    async fn run(&self, scope: TaskScope<C>) -> Result<TaskOutcome, TaskFailure> {
        if let Some(predicate) = &self.task.skip {
            if let Some(reason) = predicate(scope.context()) {
                let reason = (!reason.is_empty()).then_some(reason);
                return Ok(TaskOutcome::Skipped { reason });
            }
        }

        let output = match (self.task.work)(scope.clone()).await {
            Ok(output) => output,
            Err(err) => {
                let failure = TaskFailure::from_anyhow(Some(scope.task_id()), &scope.title(), &err);
                scope.set_output(failure.message.clone());
                return self.classify(failure, &scope);
            }
        };

        if let Some(reason) = scope.skip_reason() {
            return Ok(TaskOutcome::Skipped {
                reason: (!reason.is_empty()).then_some(reason),
            });
        }

        match output {
            TaskOutput::Done => Ok(TaskOutcome::Completed {
                output: scope.output(),
            }),
            TaskOutput::Output(text) => {
                scope.set_output(text.clone());
                Ok(TaskOutcome::Completed { output: Some(text) })
            }
            TaskOutput::Subtasks(list) => self.run_subtasks(list, &scope).await,
        }
    }
}
