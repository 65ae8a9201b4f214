use std::fmt;
use std::sync::Arc;

use crate::executor::types::TaskResult;

use super::executor::TaskFailure;

/// Failure outcome of a task list run.
///
/// Both variants carry the final shared context so callers can inspect the
/// partial progress of the run. The context type is not required to implement
/// `Debug`.
pub enum RunError<C> {
    /// Every task reached `Done`, but recoverable failures were collected.
    Aggregate {
        errors: Vec<TaskFailure>,
        results: Vec<TaskResult>,
        context: Arc<C>,
    },
    /// A wrapper surfaced a fatal failure and the run was aborted.
    Fatal {
        failure: TaskFailure,
        results: Vec<TaskResult>,
        context: Arc<C>,
    },
}

impl<C> RunError<C> {
    pub fn context(&self) -> &Arc<C> {
        match self {
            Self::Aggregate { context, .. } | Self::Fatal { context, .. } => context,
        }
    }

    pub fn into_context(self) -> Arc<C> {
        match self {
            Self::Aggregate { context, .. } | Self::Fatal { context, .. } => context,
        }
    }

    /// Failure records carried by this error, in the order they were reported.
    pub fn errors(&self) -> &[TaskFailure] {
        match self {
            Self::Aggregate { errors, .. } => errors,
            Self::Fatal { failure, .. } => std::slice::from_ref(failure),
        }
    }

    /// Results of the tasks that finished before the run ended.
    pub fn results(&self) -> &[TaskResult] {
        match self {
            Self::Aggregate { results, .. } | Self::Fatal { results, .. } => results,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

impl<C> fmt::Display for RunError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate { errors, .. } => {
                write!(f, "Something went wrong ({} task failure(s))", errors.len())
            }
            Self::Fatal { failure, .. } => write!(f, "{failure}"),
        }
    }
}

impl<C> fmt::Debug for RunError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aggregate {
                errors, results, ..
            } => f
                .debug_struct("Aggregate")
                .field("errors", errors)
                .field("results", &results.len())
                .finish_non_exhaustive(),
            Self::Fatal {
                failure, results, ..
            } => f
                .debug_struct("Fatal")
                .field("failure", failure)
                .field("results", &results.len())
                .finish_non_exhaustive(),
        }
    }
}

impl<C> std::error::Error for RunError<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Aggregate { .. } => None,
            Self::Fatal { failure, .. } => Some(failure),
        }
    }
}
