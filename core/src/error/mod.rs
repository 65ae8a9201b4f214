#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;
pub mod run;

pub use error::CliError;
pub use executor::{SchedulerError, TaskFailure};
pub use run::RunError;
