use serde::{Deserialize, Serialize};

use crate::executor::types::{Concurrency, ListOptions};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskline_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    false
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Defaults applied to every task list the binary runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// `false`/`1` for sequential, `true` for unbounded, or a positive limit.
    #[serde(default)]
    pub concurrent: Concurrency,

    /// Unset means every failure is fatal.
    #[serde(default)]
    pub exit_on_error: Option<bool>,

    /// Renderer used on an interactive terminal.
    #[serde(default = "default_renderer")]
    pub renderer: String,

    /// Renderer used when stdout is not a terminal.
    #[serde(default = "default_non_tty_renderer")]
    pub non_tty_renderer: String,

    #[serde(default = "default_show_subtasks")]
    pub show_subtasks: bool,
}

fn default_renderer() -> String {
    "default".to_string()
}

fn default_non_tty_renderer() -> String {
    "verbose".to_string()
}

fn default_show_subtasks() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrent: Concurrency::default(),
            exit_on_error: None,
            renderer: default_renderer(),
            non_tty_renderer: default_non_tty_renderer(),
            show_subtasks: default_show_subtasks(),
        }
    }
}

impl RunnerConfig {
    pub fn to_list_options(&self) -> ListOptions {
        ListOptions {
            concurrency: self.concurrent,
            exit_on_error: self.exit_on_error,
            show_subtasks: self.show_subtasks,
        }
    }
}
