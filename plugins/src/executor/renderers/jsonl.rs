use chrono::Local;
use serde_json::{json, Value};
use taskline_core::executor::traits::{RenderEvent, Renderer};

/// One JSON object per event, for machine consumers.
pub struct JsonlRenderer {
    pretty_print: bool,
}

impl JsonlRenderer {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                parent,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "parent_run_id": parent,
                    "total_tasks": total_tasks,
                }
            }),
            RenderEvent::TaskAdded {
                run_id,
                task_id,
                title,
            } => json!({
                "v": 1,
                "event_type": "task.added",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": title,
            }),
            RenderEvent::TaskEnabled {
                run_id,
                task_id,
                title,
                enabled,
            } => json!({
                "v": 1,
                "event_type": "task.enabled",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": title,
                "metadata": {
                    "enabled": enabled,
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                title,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": title,
            }),
            RenderEvent::TaskTitle {
                run_id,
                task_id,
                title,
            } => json!({
                "v": 1,
                "event_type": "task.title",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": title,
            }),
            RenderEvent::TaskOutput {
                run_id,
                task_id,
                output,
            } => json!({
                "v": 1,
                "event_type": "task.output",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "output": output,
            }),
            RenderEvent::TaskSkipped {
                run_id,
                task_id,
                result,
            } => json!({
                "v": 1,
                "event_type": "task.skipped",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": result.title,
                "metadata": {
                    "reason": result.skip_reason,
                    "duration_ms": result.duration_ms,
                }
            }),
            RenderEvent::TaskComplete {
                run_id,
                task_id,
                result,
            } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": result.title,
                "output": result.output,
                "metadata": {
                    "duration_ms": result.duration_ms,
                    "success": true,
                }
            }),
            RenderEvent::TaskFailed {
                run_id,
                task_id,
                title,
                error,
                fatal,
            } => json!({
                "v": 1,
                "event_type": "task.failed",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "title": title,
                "error": error,
                "metadata": {
                    "fatal": fatal,
                }
            }),
            RenderEvent::RunEnd {
                run_id,
                parent,
                success,
                completed,
                failed,
                duration_ms,
            } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "parent_run_id": parent,
                    "success": success,
                    "completed": completed,
                    "failed": failed,
                    "duration_ms": duration_ms,
                }
            }),
        }
    }
}

impl Renderer for JsonlRenderer {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskline_core::{TaskId, TaskResult, TaskStatus};

    fn id(n: u64) -> TaskId {
        serde_json::from_value(json!(n)).unwrap()
    }

    #[test]
    fn test_jsonl_renderer_event_type() {
        let renderer = JsonlRenderer::new(false);
        let event = RenderEvent::RunStart {
            run_id: "run".to_string(),
            parent: None,
            total_tasks: 2,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "run.start");
        assert_eq!(value["metadata"]["total_tasks"], 2);
        assert!(value["metadata"]["parent_run_id"].is_null());
    }

    #[test]
    fn test_jsonl_renderer_task_complete() {
        let renderer = JsonlRenderer::new(false);
        let event = RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            task_id: id(4),
            result: TaskResult {
                task_id: id(4),
                title: "compile".to_string(),
                status: TaskStatus::Completed,
                output: Some("ok".to_string()),
                skip_reason: None,
                error: None,
                duration_ms: 12,
            },
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.end");
        assert_eq!(value["task_id"], 4);
        assert_eq!(value["output"], "ok");
        assert_eq!(value["metadata"]["duration_ms"], 12);
    }

    #[test]
    fn test_jsonl_renderer_task_failed() {
        let renderer = JsonlRenderer::new(false);
        let event = RenderEvent::TaskFailed {
            run_id: "run".to_string(),
            task_id: id(1),
            title: "deploy".to_string(),
            error: "permission denied".to_string(),
            fatal: true,
        };

        let value = renderer.event_to_json(&event);
        assert_eq!(value["event_type"], "task.failed");
        assert_eq!(value["error"], "permission denied");
        assert_eq!(value["metadata"]["fatal"], true);
    }
}
