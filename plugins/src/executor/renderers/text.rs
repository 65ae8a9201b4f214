use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use chrono::Local;
use taskline_core::executor::traits::{RenderEvent, Renderer};
use taskline_core::TaskId;

/// Line-per-event renderer for logs and non-interactive terminals.
pub struct TextRenderer {
    timestamps: bool,
    /// Latest known title per (run, task), for events that only carry ids.
    titles: Mutex<HashMap<(String, TaskId), String>>,
}

impl TextRenderer {
    pub fn new(timestamps: bool) -> Self {
        Self {
            timestamps,
            titles: Mutex::new(HashMap::new()),
        }
    }

    fn title_of(&self, run_id: &str, task_id: TaskId) -> String {
        self.titles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(run_id.to_string(), task_id))
            .cloned()
            .unwrap_or_else(|| task_id.to_string())
    }

    fn remember(&self, run_id: &str, task_id: TaskId, title: &str) {
        self.titles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((run_id.to_string(), task_id), title.to_string());
    }

    fn format_event(&self, event: &RenderEvent) -> Option<String> {
        let line = match event {
            RenderEvent::RunStart {
                parent,
                total_tasks,
                ..
            } => {
                let kind = if parent.is_some() { "SUBTASKS" } else { "RUN" };
                format!("[{kind}] {total_tasks} task(s)")
            }
            RenderEvent::TaskAdded {
                run_id,
                task_id,
                title,
            } => {
                self.remember(run_id, *task_id, title);
                format!("[ADDED] {title}")
            }
            RenderEvent::TaskEnabled { title, enabled, .. } => {
                let state = if *enabled { "ENABLED" } else { "DISABLED" };
                format!("[{state}] {title}")
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                title,
            } => {
                self.remember(run_id, *task_id, title);
                format!("[STARTED] {title}")
            }
            RenderEvent::TaskTitle {
                run_id,
                task_id,
                title,
            } => {
                self.remember(run_id, *task_id, title);
                format!("[TITLE] {title}")
            }
            RenderEvent::TaskOutput {
                run_id,
                task_id,
                output,
            } => {
                let title = self.title_of(run_id, *task_id);
                format!("[DATA] {title}: {}", output.trim_end())
            }
            RenderEvent::TaskSkipped { result, .. } => match &result.skip_reason {
                Some(reason) => format!("[SKIPPED] {} ({reason})", result.title),
                None => format!("[SKIPPED] {}", result.title),
            },
            RenderEvent::TaskComplete { result, .. } => {
                format!("[SUCCESS] {} ({}ms)", result.title, result.duration_ms)
            }
            RenderEvent::TaskFailed {
                title,
                error,
                fatal,
                ..
            } => {
                let kind = if *fatal { "FAILED" } else { "ERROR" };
                format!("[{kind}] {title}: {error}")
            }
            RenderEvent::RunEnd {
                parent,
                success,
                completed,
                failed,
                duration_ms,
                ..
            } => {
                // The parent task's own result line covers nested runs.
                if parent.is_some() {
                    return None;
                }
                let status = if *success { "DONE" } else { "FAILED" };
                format!("[{status}] completed {completed}, failed {failed}, duration {duration_ms}ms")
            }
        };

        if self.timestamps {
            Some(format!("[{}] {line}", Local::now().format("%H:%M:%S")))
        } else {
            Some(line)
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        "verbose"
    }

    fn render(&self, event: &RenderEvent) {
        if let Some(line) = self.format_event(event) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskline_core::{TaskResult, TaskStatus};

    fn id(n: u64) -> TaskId {
        serde_json::from_value(serde_json::json!(n)).unwrap()
    }

    fn result(title: &str, status: TaskStatus, skip_reason: Option<&str>) -> TaskResult {
        TaskResult {
            task_id: id(0),
            title: title.to_string(),
            status,
            output: None,
            skip_reason: skip_reason.map(str::to_string),
            error: None,
            duration_ms: 7,
        }
    }

    #[test]
    fn test_text_renderer_output_uses_the_known_title() {
        let renderer = TextRenderer::new(false);
        renderer.format_event(&RenderEvent::TaskStart {
            run_id: "run".to_string(),
            task_id: id(3),
            title: "install".to_string(),
        });

        let line = renderer.format_event(&RenderEvent::TaskOutput {
            run_id: "run".to_string(),
            task_id: id(3),
            output: "resolving 42 packages\n".to_string(),
        });
        assert_eq!(line.as_deref(), Some("[DATA] install: resolving 42 packages"));
    }

    #[test]
    fn test_text_renderer_task_end_lines() {
        let renderer = TextRenderer::new(false);

        let done = renderer.format_event(&RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            task_id: id(0),
            result: result("build", TaskStatus::Completed, None),
        });
        assert_eq!(done.as_deref(), Some("[SUCCESS] build (7ms)"));

        let skipped = renderer.format_event(&RenderEvent::TaskSkipped {
            run_id: "run".to_string(),
            task_id: id(0),
            result: result("build", TaskStatus::Skipped, Some("cached")),
        });
        assert_eq!(skipped.as_deref(), Some("[SKIPPED] build (cached)"));

        let failed = renderer.format_event(&RenderEvent::TaskFailed {
            run_id: "run".to_string(),
            task_id: id(0),
            title: "build".to_string(),
            error: "exit 2".to_string(),
            fatal: true,
        });
        assert_eq!(failed.as_deref(), Some("[FAILED] build: exit 2"));
    }

    #[test]
    fn test_nested_run_end_is_not_printed() {
        let renderer = TextRenderer::new(false);
        let line = renderer.format_event(&RenderEvent::RunEnd {
            run_id: "child".to_string(),
            parent: Some("root".to_string()),
            success: true,
            completed: 2,
            failed: 0,
            duration_ms: 3,
        });
        assert!(line.is_none());
    }

    #[test]
    fn test_timestamps_prefix_each_line() {
        let renderer = TextRenderer::new(true);
        let line = renderer
            .format_event(&RenderEvent::RunStart {
                run_id: "run".to_string(),
                parent: None,
                total_tasks: 4,
            })
            .unwrap();
        assert!(line.ends_with("] [RUN] 4 task(s)"), "{line}");
        assert_eq!(line.as_bytes()[0], b'[');
    }
}
