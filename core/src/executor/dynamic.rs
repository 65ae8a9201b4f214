use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::SchedulerError;
use crate::executor::traits::Runnable;
use crate::executor::types::Task;
use crate::executor::wrapper::TaskWrapper;

pub(crate) type Inbox<C> = UnboundedReceiver<Arc<dyn Runnable<C>>>;

enum Lifecycle<C> {
    NotStarted,
    Running(UnboundedSender<Arc<dyn Runnable<C>>>),
    Sealed,
}

/// Handle for adding tasks to a list while it runs.
///
/// Insertion is only accepted between the start of a run and the moment the
/// run detects that every task is done. The seal step and insertion take the
/// same lock, so a task is either seen by the run or rejected with
/// [`SchedulerError::InvalidState`], never lost.
pub struct DynamicTasks<C> {
    state: Arc<Mutex<Lifecycle<C>>>,
}

impl<C> Clone for DynamicTasks<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: Send + Sync + 'static> DynamicTasks<C> {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(Lifecycle::NotStarted)),
        }
    }

    pub fn add(&self, task: Task<C>) -> Result<(), SchedulerError> {
        self.add_runnable(Arc::new(TaskWrapper::new(task)))
    }

    pub fn add_runnable(&self, runnable: Arc<dyn Runnable<C>>) -> Result<(), SchedulerError> {
        let state = self.lock();
        match &*state {
            Lifecycle::Running(tx) => {
                debug!(title = %runnable.title(), "DynamicTasks::add: queued");
                tx.send(runnable).map_err(|_| {
                    SchedulerError::InvalidState("the task list is no longer running".to_string())
                })
            }
            Lifecycle::NotStarted => Err(SchedulerError::InvalidState(
                "tasks can only be added dynamically while the list is running".to_string(),
            )),
            Lifecycle::Sealed => Err(SchedulerError::InvalidState(
                "the task list has already finished".to_string(),
            )),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.lock(), Lifecycle::Running(_))
    }

    /// Start accepting insertions for a new run.
    pub(crate) fn open(&self) -> Inbox<C> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.lock() = Lifecycle::Running(tx);
        rx
    }

    /// Seal the list unless insertions are still queued.
    ///
    /// Returns the queued tasks when there are any; an empty Vec means the
    /// list is now sealed and later insertions fail.
    pub(crate) fn try_seal(&self, inbox: &mut Inbox<C>) -> Vec<Arc<dyn Runnable<C>>> {
        let mut state = self.lock();
        let mut late = Vec::new();
        while let Ok(runnable) = inbox.try_recv() {
            late.push(runnable);
        }
        if late.is_empty() {
            *state = Lifecycle::Sealed;
            debug!("DynamicTasks::try_seal: sealed");
        }
        late
    }

    /// Seal unconditionally; used when the run aborts.
    pub(crate) fn seal(&self) {
        *self.lock() = Lifecycle::Sealed;
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle<C>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::TaskOutput;

    fn noop(title: &str) -> Task<()> {
        Task::new(title.to_string(), |_| async { anyhow::Ok(TaskOutput::Done) })
    }

    #[test]
    fn test_rejects_before_start() {
        let dynamic = DynamicTasks::<()>::new();
        let err = dynamic.add(noop("early")).unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_seal_drains_queued_insertions_first() {
        let dynamic = DynamicTasks::<()>::new();
        let mut inbox = dynamic.open();

        dynamic.add(noop("late")).unwrap();
        let late = dynamic.try_seal(&mut inbox);
        assert_eq!(late.len(), 1);
        assert!(dynamic.is_running());

        assert!(dynamic.try_seal(&mut inbox).is_empty());
        assert!(!dynamic.is_running());
        assert!(dynamic.add(noop("too late")).unwrap_err().is_invalid_state());
    }
}
