use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{RunError, SchedulerError, TaskFailure};

use super::collector::ErrorCollector;
use super::dynamic::{DynamicTasks, Inbox};
use super::scheduler::{Dispatch, TaskTable};
use super::scope::{ScopeParts, TaskScope};
use super::traits::{RenderEvent, Renderer, Runnable};
use super::types::{
    ListOptions, RunOutput, Task, TaskId, TaskOutcome, TaskResult, TaskStatus,
};
use super::wrapper::TaskWrapper;

/// Outcome of one spawned wrapper invocation.
struct Finished {
    id: TaskId,
    title: String,
    output: Option<String>,
    outcome: Result<TaskOutcome, TaskFailure>,
    duration_ms: u64,
}

/// Per-run bookkeeping owned by the run loop.
struct RunState<C> {
    run_id: Arc<str>,
    context: Arc<C>,
    table: TaskTable<C>,
    errors: ErrorCollector,
    results: Vec<TaskResult>,
    added: Vec<Arc<dyn Runnable<C>>>,
}

/// An ordered list of tasks, run with a bounded concurrency degree.
///
/// Tasks are dispatched in registration order and may finish in any order.
/// Recoverable failures are collected and turned into a single
/// [`RunError::Aggregate`] once every task is done; a fatal failure ends the
/// run immediately with [`RunError::Fatal`]. While a run is in progress new
/// tasks can be added through [`TaskList::add_dynamic`],
/// [`TaskScope::add_task`] or a [`DynamicTasks`] handle.
///
/// The context is shared by every task through an `Arc<C>` and is not locked
/// by the scheduler. With a concurrency degree above one, tasks writing the
/// same fields must coordinate through `C`'s own interior mutability.
pub struct TaskList<C> {
    tasks: Vec<Arc<dyn Runnable<C>>>,
    options: ListOptions,
    renderer: Option<Arc<dyn Renderer>>,
    dynamic: DynamicTasks<C>,
    parent: Option<String>,
}

impl<C: Send + Sync + 'static> TaskList<C> {
    pub fn new(options: ListOptions) -> Self {
        Self {
            tasks: Vec::new(),
            options,
            renderer: None,
            dynamic: DynamicTasks::new(),
            parent: None,
        }
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task<C>>, options: ListOptions) -> Self {
        let mut list = Self::new(options);
        list.add_all(tasks);
        list
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn add(&mut self, task: Task<C>) -> &mut Self {
        self.add_runnable(Arc::new(TaskWrapper::new(task)))
    }

    pub fn add_all(&mut self, tasks: impl IntoIterator<Item = Task<C>>) -> &mut Self {
        for task in tasks {
            self.add(task);
        }
        self
    }

    /// Register a task that brings its own execution wrapper.
    pub fn add_runnable(&mut self, runnable: Arc<dyn Runnable<C>>) -> &mut Self {
        self.tasks.push(runnable);
        self
    }

    /// Add a task to the run currently in progress.
    ///
    /// Fails with [`SchedulerError::InvalidState`] before the first run
    /// starts and once a run has detected completion.
    pub fn add_dynamic(&self, task: Task<C>) -> Result<(), SchedulerError> {
        self.dynamic.add(task)
    }

    /// Cloneable handle for dynamic insertion from outside the list.
    pub fn dynamic_handle(&self) -> DynamicTasks<C> {
        self.dynamic.clone()
    }

    pub fn set_renderer(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn renderer(&self) -> Option<&Arc<dyn Renderer>> {
        self.renderer.as_ref()
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ListOptions {
        &mut self.options
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.title()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn set_parent(&mut self, parent_run_id: &str) {
        self.parent = Some(parent_run_id.to_string());
    }

    /// Run every task against `context` and return it when all are done.
    ///
    /// Dynamic insertion is accepted from the moment this is called, before
    /// the returned future is first polled.
    pub fn run(
        &mut self,
        context: C,
    ) -> impl Future<Output = Result<RunOutput<C>, RunError<C>>> + '_ {
        self.run_shared(Arc::new(context))
    }

    /// Same as [`run`](Self::run) for a context that is already shared, such
    /// as the parent's context when running subtasks.
    pub fn run_shared(
        &mut self,
        context: Arc<C>,
    ) -> impl Future<Output = Result<RunOutput<C>, RunError<C>>> + '_ {
        let inbox = self.dynamic.open();
        self.drive(context, inbox)
    }

    async fn drive(
        &mut self,
        context: Arc<C>,
        mut inbox: Inbox<C>,
    ) -> Result<RunOutput<C>, RunError<C>> {
        let started = Instant::now();
        let mut run = RunState {
            run_id: Arc::from(Uuid::new_v4().to_string()),
            context,
            table: TaskTable::new(self.options.concurrency),
            errors: ErrorCollector::new(),
            results: Vec::new(),
            added: Vec::new(),
        };
        for runnable in &self.tasks {
            run.table.register(Arc::clone(runnable));
        }

        debug!(
            run_id = %run.run_id,
            tasks = run.table.len(),
            concurrency = %self.options.concurrency,
            "TaskList::run: starting"
        );
        self.emit(RenderEvent::RunStart {
            run_id: run.run_id.to_string(),
            parent: self.parent.clone(),
            total_tasks: run.table.len(),
        });
        run.table.refresh(&run.context);
        self.emit_enablement(&mut run);

        let mut in_flight: JoinSet<Finished> = JoinSet::new();

        loop {
            self.dispatch(&mut run, &mut in_flight);

            if run.table.is_idle() {
                let late = self.dynamic.try_seal(&mut inbox);
                if late.is_empty() {
                    break;
                }
                for runnable in late {
                    self.insert(&mut run, runnable);
                }
                continue;
            }

            tokio::select! {
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let finished = match joined {
                        Ok(finished) => finished,
                        Err(err) => {
                            let failure = TaskFailure::new(None, "task", format!("task join failed: {err}"));
                            return Err(self.abort(run, in_flight, failure, started));
                        }
                    };
                    if let Err(failure) = self.complete(&mut run, finished) {
                        return Err(self.abort(run, in_flight, failure, started));
                    }
                }
                Some(runnable) = inbox.recv() => {
                    self.insert(&mut run, runnable);
                }
                // A table that is not idle always has a task in flight.
                else => break,
            }
        }

        self.finish(run, started)
    }

    /// One dispatch pass: start every task the table hands out.
    fn dispatch(&self, run: &mut RunState<C>, in_flight: &mut JoinSet<Finished>) {
        let decisions = run.table.dispatch(&run.context);
        self.emit_enablement(run);

        for decision in decisions {
            let Dispatch::Run { id, runnable } = decision else {
                continue;
            };
            let title = runnable.title().to_string();
            self.emit(RenderEvent::TaskStart {
                run_id: run.run_id.to_string(),
                task_id: id,
                title: title.clone(),
            });
            let scope = TaskScope::new(ScopeParts {
                context: Arc::clone(&run.context),
                task_id: id,
                title,
                run_id: Arc::clone(&run.run_id),
                errors: run.errors.clone(),
                dynamic: self.dynamic.clone(),
                renderer: self.renderer.clone(),
                exit_on_error: self.options.exit_on_error,
                show_subtasks: self.options.show_subtasks,
            });
            in_flight.spawn(invoke(id, runnable, scope));
        }
    }

    fn insert(&self, run: &mut RunState<C>, runnable: Arc<dyn Runnable<C>>) {
        let id = run.table.register(Arc::clone(&runnable));
        debug!(run_id = %run.run_id, %id, "TaskList::run: dynamic insertion");
        self.emit(RenderEvent::TaskAdded {
            run_id: run.run_id.to_string(),
            task_id: id,
            title: runnable.title().to_string(),
        });
        run.added.push(runnable);
    }

    /// Record a finished task. A fatal failure is handed back to the caller.
    fn complete(&self, run: &mut RunState<C>, finished: Finished) -> Result<(), TaskFailure> {
        run.table.complete(finished.id);
        run.table.refresh(&run.context);
        self.emit_enablement(run);

        let mut result = TaskResult {
            task_id: finished.id,
            title: finished.title,
            status: TaskStatus::Completed,
            output: finished.output,
            skip_reason: None,
            error: None,
            duration_ms: finished.duration_ms,
        };
        let run_id = run.run_id.to_string();

        match finished.outcome {
            Ok(TaskOutcome::Completed { output }) => {
                result.output = output.or(result.output);
                self.emit(RenderEvent::TaskComplete {
                    run_id,
                    task_id: finished.id,
                    result: result.clone(),
                });
            }
            Ok(TaskOutcome::Skipped { reason }) => {
                result.status = TaskStatus::Skipped;
                result.skip_reason = reason;
                self.emit(RenderEvent::TaskSkipped {
                    run_id,
                    task_id: finished.id,
                    result: result.clone(),
                });
            }
            Ok(TaskOutcome::Failed(failure)) => {
                result.status = TaskStatus::Failed;
                result.error = Some(failure.message.clone());
                self.emit(RenderEvent::TaskFailed {
                    run_id,
                    task_id: finished.id,
                    title: result.title.clone(),
                    error: failure.message,
                    fatal: false,
                });
            }
            Err(failure) => {
                self.emit(RenderEvent::TaskFailed {
                    run_id,
                    task_id: finished.id,
                    title: result.title,
                    error: failure.message.clone(),
                    fatal: true,
                });
                return Err(failure);
            }
        }

        debug!(
            run_id = %run.run_id,
            id = %finished.id,
            status = ?result.status,
            done = run.table.done_count(),
            total = run.table.len(),
            "TaskList::run: task done"
        );
        run.results.push(result);
        Ok(())
    }

    /// Stop scheduling after a fatal failure. Tasks still in flight are
    /// detached and finish in the background.
    fn abort(
        &mut self,
        run: RunState<C>,
        mut in_flight: JoinSet<Finished>,
        failure: TaskFailure,
        started: Instant,
    ) -> RunError<C> {
        warn!(
            run_id = %run.run_id,
            error = %failure,
            detached = in_flight.len(),
            "TaskList::run: fatal failure, aborting"
        );
        in_flight.detach_all();
        self.dynamic.seal();
        self.emit(RenderEvent::RunEnd {
            run_id: run.run_id.to_string(),
            parent: self.parent.clone(),
            success: false,
            completed: run.results.len(),
            failed: run.errors.len() + 1,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        self.tasks.extend(run.added);

        RunError::Fatal {
            failure,
            results: run.results,
            context: run.context,
        }
    }

    fn finish(
        &mut self,
        run: RunState<C>,
        started: Instant,
    ) -> Result<RunOutput<C>, RunError<C>> {
        let errors = run.errors.snapshot();
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            run_id = %run.run_id,
            results = run.results.len(),
            errors = errors.len(),
            duration_ms,
            "TaskList::run: finished"
        );
        self.emit(RenderEvent::RunEnd {
            run_id: run.run_id.to_string(),
            parent: self.parent.clone(),
            success: errors.is_empty(),
            completed: run.results.len(),
            failed: errors.len(),
            duration_ms,
        });
        self.tasks.extend(run.added);

        if !errors.is_empty() {
            return Err(RunError::Aggregate {
                errors,
                results: run.results,
                context: run.context,
            });
        }

        Ok(RunOutput {
            run_id: run.run_id.to_string(),
            context: run.context,
            results: run.results,
            duration_ms,
        })
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }

    fn emit_enablement(&self, run: &mut RunState<C>) {
        for (id, enabled) in run.table.take_enablement_changes() {
            let title = run.table.title(id).unwrap_or_default().to_string();
            self.emit(RenderEvent::TaskEnabled {
                run_id: run.run_id.to_string(),
                task_id: id,
                title,
                enabled,
            });
        }
    }
}

/// Run one wrapper to completion, turning a panic into a fatal failure.
async fn invoke<C: Send + Sync + 'static>(
    id: TaskId,
    runnable: Arc<dyn Runnable<C>>,
    scope: TaskScope<C>,
) -> Finished {
    let started = Instant::now();
    let outcome = AssertUnwindSafe(runnable.run(scope.clone()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(TaskFailure::new(
                Some(id),
                scope.title(),
                format!("task panicked: {}", panic_message(panic.as_ref())),
            ))
        });

    Finished {
        id,
        title: scope.title(),
        output: scope.output(),
        outcome,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
