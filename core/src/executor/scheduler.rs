use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::traits::Runnable;
use super::types::{Concurrency, TaskId, TaskState};

struct TaskEntry<C> {
    id: TaskId,
    state: TaskState,
    enabled: bool,
    runnable: Arc<dyn Runnable<C>>,
}

/// Decision produced by one dispatch pass.
pub enum Dispatch<C> {
    /// Marked `Running`; the caller must invoke the runnable.
    Run {
        id: TaskId,
        runnable: Arc<dyn Runnable<C>>,
    },
    /// Disabled when it reached the front of the queue; resolved as a no-op.
    Skip { id: TaskId },
}

/// Task lifecycle table and dispatch state machine.
///
/// Purely synchronous: the async run loop owns one table per run and calls
/// [`TaskTable::dispatch`] after every state change (task completion or
/// insertion). Dispatch follows registration order; the number of `Running`
/// handles never exceeds the concurrency degree.
pub struct TaskTable<C> {
    entries: Vec<TaskEntry<C>>,
    index: HashMap<TaskId, usize>,
    next_id: u64,
    /// Entries before this position are no longer pending.
    first_pending: usize,
    concurrency: Concurrency,
    running: usize,
    peak_running: usize,
    enablement_changes: Vec<(TaskId, bool)>,
}

impl<C> TaskTable<C> {
    pub fn new(concurrency: Concurrency) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
            first_pending: 0,
            concurrency,
            running: 0,
            peak_running: 0,
            enablement_changes: Vec::new(),
        }
    }

    /// Append a `Pending` handle and return its fresh identity.
    pub fn register(&mut self, runnable: Arc<dyn Runnable<C>>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.entries.len());
        debug!(%id, title = %runnable.title(), "TaskTable::register");
        self.entries.push(TaskEntry {
            id,
            state: TaskState::Pending,
            enabled: true,
            runnable,
        });
        id
    }

    /// Re-derive the enablement flag of every pending handle.
    ///
    /// Running and done handles are left alone; their enablement no longer
    /// affects dispatch, so no flips are reported for them.
    pub fn refresh(&mut self, context: &C) {
        for entry in &mut self.entries[self.first_pending..] {
            if entry.state != TaskState::Pending {
                continue;
            }
            let enabled = entry.runnable.is_enabled(context);
            if enabled != entry.enabled {
                entry.enabled = enabled;
                self.enablement_changes.push((entry.id, enabled));
            }
        }
    }

    /// Enablement flips observed by [`refresh`](Self::refresh) since the last call.
    pub fn take_enablement_changes(&mut self) -> Vec<(TaskId, bool)> {
        std::mem::take(&mut self.enablement_changes)
    }

    /// Fill free concurrency slots with the earliest pending handles.
    ///
    /// Enablement is re-checked against `context` right before each handle is
    /// taken, since a finished task may have changed it. A disabled handle is
    /// moved straight to `Done` without using a slot.
    pub fn dispatch(&mut self, context: &C) -> Vec<Dispatch<C>> {
        let mut decisions = Vec::new();

        while self.concurrency.allows(self.running) {
            let Some(pos) = self.next_pending() else {
                break;
            };
            self.refresh(context);

            let entry = &mut self.entries[pos];
            if !entry.enabled {
                entry.state = TaskState::Done;
                debug!(id = %entry.id, "TaskTable::dispatch: disabled, resolved as no-op");
                decisions.push(Dispatch::Skip { id: entry.id });
                continue;
            }

            entry.state = TaskState::Running;
            self.running += 1;
            self.peak_running = self.peak_running.max(self.running);
            debug!(id = %entry.id, running = self.running, "TaskTable::dispatch: running");
            decisions.push(Dispatch::Run {
                id: entry.id,
                runnable: Arc::clone(&entry.runnable),
            });
        }

        decisions
    }

    /// Move a `Running` handle to `Done`. Returns false for any other state.
    pub fn complete(&mut self, id: TaskId) -> bool {
        let Some(&pos) = self.index.get(&id) else {
            return false;
        };
        let entry = &mut self.entries[pos];
        if entry.state != TaskState::Running {
            debug!(%id, state = ?entry.state, "TaskTable::complete: not running");
            return false;
        }
        entry.state = TaskState::Done;
        self.running -= 1;
        true
    }

    /// No pending and no running handles left.
    pub fn is_idle(&self) -> bool {
        self.running == 0 && self.pending_count() == 0
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.index.get(&id).map(|&pos| self.entries[pos].state)
    }

    pub fn is_enabled(&self, id: TaskId) -> Option<bool> {
        self.index.get(&id).map(|&pos| self.entries[pos].enabled)
    }

    pub fn title(&self, id: TaskId) -> Option<&str> {
        self.index
            .get(&id)
            .map(|&pos| self.entries[pos].runnable.title())
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn pending_count(&self) -> usize {
        self.entries[self.first_pending..]
            .iter()
            .filter(|e| e.state == TaskState::Pending)
            .count()
    }

    pub fn done_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == TaskState::Done)
            .count()
    }

    /// Highest number of simultaneously running handles seen so far.
    pub fn peak_running(&self) -> usize {
        self.peak_running
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_pending(&mut self) -> Option<usize> {
        while self.first_pending < self.entries.len()
            && self.entries[self.first_pending].state != TaskState::Pending
        {
            self.first_pending += 1;
        }
        (self.first_pending < self.entries.len()).then_some(self.first_pending)
    }
}
