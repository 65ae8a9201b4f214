use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::TaskFailure;

/// Append-only list of recoverable failures, shared by every task of a run.
///
/// Cloning yields another handle to the same list.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    inner: Arc<Mutex<Vec<TaskFailure>>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, failure: TaskFailure) {
        tracing::debug!(title = %failure.title, message = %failure.message, "ErrorCollector::push");
        self.lock().push(failure);
    }

    pub fn extend(&self, failures: impl IntoIterator<Item = TaskFailure>) {
        self.lock().extend(failures);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the collected failures, in the order they were pushed.
    pub fn snapshot(&self) -> Vec<TaskFailure> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskFailure>> {
        // A panicking task cannot leave the Vec half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_same_list() {
        let errors = ErrorCollector::new();
        let handle = errors.clone();

        handle.push(TaskFailure::new(None, "lint", "2 warnings"));
        errors.push(TaskFailure::new(None, "test", "1 failed"));

        let titles: Vec<_> = errors.snapshot().into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["lint", "test"]);
        assert_eq!(handle.len(), 2);
    }
}
