use std::path::Path;

use serde::Deserialize;
use taskline_core::error::{CliError, SchedulerError};
use taskline_core::Concurrency;

/// Top-level `[options]` block of a task file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileOptions {
    #[serde(default)]
    pub concurrent: Option<Concurrency>,

    #[serde(default)]
    pub exit_on_error: Option<bool>,
}

/// One `[[tasks]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    pub title: String,

    /// Shell command; optional when the task only groups subtasks.
    #[serde(default)]
    pub run: Option<String>,

    /// Only dispatch while this context variable is set and non-empty.
    #[serde(default)]
    pub enabled_if: Option<String>,

    /// Skip when this context variable is set and non-empty.
    #[serde(default)]
    pub skip_if: Option<String>,

    /// Store the command's trimmed stdout in this context variable.
    #[serde(default)]
    pub capture: Option<String>,

    /// Add one task per non-empty stdout line to the running list.
    #[serde(default)]
    pub expand: bool,

    #[serde(default)]
    pub exit_on_error: Option<bool>,

    /// Concurrency of the nested `subtasks` list.
    #[serde(default)]
    pub concurrent: Option<Concurrency>,

    #[serde(default)]
    pub subtasks: Vec<TaskSpec>,
}

impl TaskSpec {
    /// A plain command task, as produced by `expand`.
    pub fn command(line: &str) -> Self {
        Self {
            title: line.to_string(),
            run: Some(line.to_string()),
            ..Self::default()
        }
    }

    fn validate(&self, path: &str) -> Result<(), CliError> {
        if self.title.trim().is_empty() {
            return Err(CliError::TaskFile(format!("{path}: title must not be empty")));
        }
        if self.run.is_none() && self.subtasks.is_empty() {
            return Err(CliError::TaskFile(format!(
                "{path} ({}): needs `run` or `subtasks`",
                self.title
            )));
        }
        if self.run.is_none() && (self.capture.is_some() || self.expand) {
            return Err(CliError::TaskFile(format!(
                "{path} ({}): `capture` and `expand` need a `run` command",
                self.title
            )));
        }
        for (i, sub) in self.subtasks.iter().enumerate() {
            sub.validate(&format!("{path}.subtasks[{i}]"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskFile {
    #[serde(default)]
    pub options: FileOptions,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl TaskFile {
    pub fn parse(src: &str) -> Result<Self, CliError> {
        let value: toml::Value =
            toml::from_str(src).map_err(|e| CliError::TaskFile(e.to_string()))?;

        if let Some(tasks) = value.get("tasks") {
            if !tasks.is_array() {
                return Err(CliError::Scheduler(SchedulerError::Config(
                    "Expected an array of tasks, found a single table. Use [[tasks]]".to_string(),
                )));
            }
        }

        let file: TaskFile = value
            .try_into()
            .map_err(|e: toml::de::Error| CliError::TaskFile(e.to_string()))?;
        for (i, task) in file.tasks.iter().enumerate() {
            task.validate(&format!("tasks[{i}]"))?;
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let src = std::fs::read_to_string(path)?;
        Self::parse(&src)
    }

    /// Indented outline of the task tree, one line per task.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for task in &self.tasks {
            outline_task(task, 0, &mut out);
        }
        out
    }
}

fn outline_task(task: &TaskSpec, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}- {}", task.title));
    if let Some(cmd) = &task.run {
        out.push_str(&format!("  $ {cmd}"));
    }
    if let Some(var) = &task.enabled_if {
        out.push_str(&format!("  [if {var}]"));
    }
    if let Some(var) = &task.skip_if {
        out.push_str(&format!("  [skip if {var}]"));
    }
    out.push('\n');
    for sub in &task.subtasks {
        outline_task(sub, depth + 1, out);
    }
}
