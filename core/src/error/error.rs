use thiserror::Error;

use super::executor::SchedulerError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{failed} task(s) failed")]
    TasksFailed { failed: usize },
    #[error("task list aborted: {0}")]
    Aborted(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("task file error: {0}")]
    TaskFile(String),
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
