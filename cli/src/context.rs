use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use taskline_core::error::CliError;

/// Variables shared by every task of a task file run.
///
/// Exported to each command's environment, written by `capture` and read by
/// `enabled_if` / `skip_if`.
#[derive(Debug, Default)]
pub struct ShellContext {
    vars: Mutex<HashMap<String, String>>,
}

impl ShellContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `KEY=VALUE` assignments from the command line.
    pub fn from_assignments(assignments: &[String]) -> Result<Self, CliError> {
        let ctx = Self::new();
        for item in assignments {
            let (key, value) = item
                .split_once('=')
                .filter(|(k, _)| !k.trim().is_empty())
                .ok_or_else(|| CliError::Config(format!("invalid --set value (expected KEY=VALUE): {item}")))?;
            ctx.set(key.trim(), value);
        }
        Ok(ctx)
    }

    pub fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Set and non-empty.
    pub fn is_set(&self, key: &str) -> bool {
        self.lock().get(key).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn env(&self) -> HashMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(|e| e.into_inner())
    }
}
