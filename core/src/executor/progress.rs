use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::traits::{RenderEvent, Renderer};
use super::types::TaskId;

struct ProgressState {
    overall: Option<ProgressBar>,
    task_bars: HashMap<(String, TaskId), ProgressBar>,
}

/// Visual progress renderer for task lists
///
/// Shows an overall bar for the root list and a spinner per running task.
/// Nested subtask lists share the same bars and extend the overall length.
pub struct ProgressRenderer {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
    enabled: bool,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// A renderer that tracks bars without drawing anything.
    pub fn hidden() -> Self {
        Self::with_enabled(false)
    }

    fn with_enabled(enabled: bool) -> Self {
        let multi = if enabled {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        Self {
            multi,
            state: Mutex::new(ProgressState {
                overall: None,
                task_bars: HashMap::new(),
            }),
            enabled,
        }
    }

    /// Position and length of the overall bar, if a root run has started.
    pub fn overall_position(&self) -> Option<(u64, u64)> {
        let state = self.lock();
        state
            .overall
            .as_ref()
            .map(|bar| (bar.position(), bar.length().unwrap_or(0)))
    }

    pub fn active_spinners(&self) -> usize {
        self.lock().task_bars.len()
    }

    fn overall_bar(&self, total: usize) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(total as u64));
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        bar.set_style(style);
        bar.set_message("Starting...");
        bar
    }

    fn spinner(&self, title: &str) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.set_message(format!("⏳ {title}"));
        if self.enabled {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        bar
    }

    fn finish_task(&self, run_id: &str, task_id: TaskId, message: String) {
        let mut state = self.lock();
        if let Some(bar) = state.task_bars.remove(&(run_id.to_string(), task_id)) {
            bar.finish_with_message(message);
        }
        if let Some(overall) = &state.overall {
            overall.inc(1);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for ProgressRenderer {
    fn name(&self) -> &str {
        "default"
    }

    fn render(&self, event: &RenderEvent) {
        match event {
            RenderEvent::RunStart {
                parent,
                total_tasks,
                ..
            } => {
                let mut state = self.lock();
                if let (Some(overall), Some(_)) = (&state.overall, parent) {
                    overall.inc_length(*total_tasks as u64);
                    return;
                }
                state.overall = Some(self.overall_bar(*total_tasks));
            }
            RenderEvent::TaskAdded { .. } => {
                if let Some(overall) = &self.lock().overall {
                    overall.inc_length(1);
                }
            }
            RenderEvent::TaskEnabled {
                enabled: false,
                ..
            } => {
                // Disabled tasks never start; count them as done.
                if let Some(overall) = &self.lock().overall {
                    overall.inc(1);
                }
            }
            RenderEvent::TaskEnabled { enabled: true, .. } => {
                if let Some(overall) = &self.lock().overall {
                    if overall.position() > 0 {
                        overall.set_position(overall.position() - 1);
                    }
                }
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                title,
            } => {
                let bar = self.spinner(title);
                self.lock().task_bars.insert((run_id.clone(), *task_id), bar);
            }
            RenderEvent::TaskTitle {
                run_id,
                task_id,
                title,
            } => {
                if let Some(bar) = self.lock().task_bars.get(&(run_id.clone(), *task_id)) {
                    bar.set_message(format!("⏳ {title}"));
                }
            }
            RenderEvent::TaskOutput {
                run_id,
                task_id,
                output,
            } => {
                let state = self.lock();
                if let Some(bar) = state.task_bars.get(&(run_id.clone(), *task_id)) {
                    let line = output.lines().last().unwrap_or_default();
                    bar.set_message(format!("⏳ {line}"));
                }
            }
            RenderEvent::TaskSkipped {
                run_id,
                task_id,
                result,
            } => {
                let reason = result.skip_reason.as_deref().unwrap_or("skipped");
                self.finish_task(run_id, *task_id, format!("↓ {} [{reason}]", result.title));
            }
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                result,
            } => {
                self.finish_task(
                    run_id,
                    *task_id,
                    format!("✅ {} ({}ms)", result.title, result.duration_ms),
                );
            }
            RenderEvent::TaskFailed {
                run_id,
                task_id,
                title,
                error,
                ..
            } => {
                self.finish_task(run_id, *task_id, format!("❌ {title}: {error}"));
            }
            RenderEvent::RunEnd {
                parent: None,
                success,
                ..
            } => {
                let mut state = self.lock();
                for (_, bar) in state.task_bars.drain() {
                    bar.finish_and_clear();
                }
                if let Some(overall) = &state.overall {
                    let msg = if *success {
                        "✅ All tasks completed"
                    } else {
                        "❌ Execution failed"
                    };
                    overall.finish_with_message(msg);
                }
            }
            RenderEvent::RunEnd { .. } => {}
        }
    }
}

impl Drop for ProgressRenderer {
    fn drop(&mut self) {
        for (_, bar) in self.lock().task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::{TaskResult, TaskStatus};

    fn result(id: u64, title: &str) -> TaskResult {
        TaskResult {
            task_id: TaskId(id),
            title: title.to_string(),
            status: TaskStatus::Completed,
            output: None,
            skip_reason: None,
            error: None,
            duration_ms: 5,
        }
    }

    #[test]
    fn test_progress_renderer_tracks_tasks() {
        let renderer = ProgressRenderer::hidden();
        let run_id = "run".to_string();

        renderer.render(&RenderEvent::RunStart {
            run_id: run_id.clone(),
            parent: None,
            total_tasks: 2,
        });
        renderer.render(&RenderEvent::TaskStart {
            run_id: run_id.clone(),
            task_id: TaskId(0),
            title: "first".into(),
        });
        renderer.render(&RenderEvent::TaskStart {
            run_id: run_id.clone(),
            task_id: TaskId(1),
            title: "second".into(),
        });
        assert_eq!(renderer.active_spinners(), 2);

        renderer.render(&RenderEvent::TaskComplete {
            run_id: run_id.clone(),
            task_id: TaskId(0),
            result: result(0, "first"),
        });
        renderer.render(&RenderEvent::TaskFailed {
            run_id: run_id.clone(),
            task_id: TaskId(1),
            title: "second".into(),
            error: "boom".into(),
            fatal: false,
        });

        assert_eq!(renderer.active_spinners(), 0);
        assert_eq!(renderer.overall_position(), Some((2, 2)));
    }

    #[test]
    fn test_nested_runs_extend_the_overall_bar() {
        let renderer = ProgressRenderer::hidden();

        renderer.render(&RenderEvent::RunStart {
            run_id: "root".into(),
            parent: None,
            total_tasks: 1,
        });
        renderer.render(&RenderEvent::RunStart {
            run_id: "child".into(),
            parent: Some("root".into()),
            total_tasks: 3,
        });
        renderer.render(&RenderEvent::TaskAdded {
            run_id: "child".into(),
            task_id: TaskId(3),
            title: "late".into(),
        });

        assert_eq!(renderer.overall_position(), Some((0, 5)));
    }

    #[test]
    fn test_events_without_a_run_are_ignored() {
        let renderer = ProgressRenderer::hidden();
        renderer.render(&RenderEvent::TaskOutput {
            run_id: "none".into(),
            task_id: TaskId(0),
            output: "line".into(),
        });
        renderer.render(&RenderEvent::RunEnd {
            run_id: "none".into(),
            parent: None,
            success: true,
            completed: 0,
            failed: 0,
            duration_ms: 0,
        });
        assert_eq!(renderer.overall_position(), None);
    }
}
