#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use taskline_core::{RenderEvent, Renderer, Task, TaskOutput, TaskScope};

/// Route scheduler logs to the test harness; `RUST_LOG=taskline_core=debug`
/// shows every dispatch decision.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared context used by the integration tests.
#[derive(Default)]
pub struct Ctx {
    pub running: AtomicUsize,
    pub peak: AtomicUsize,
    pub runs: AtomicUsize,
    pub unlocked: AtomicBool,
    pub log: Mutex<Vec<String>>,
}

impl Ctx {
    pub fn enter(&self) {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn record(&self, entry: &str) {
        self.log.lock().unwrap().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

/// A task that records its title, holding a concurrency slot for `ms`.
pub fn timed(title: &str, ms: u64) -> Task<Ctx> {
    let name = title.to_string();
    Task::new(title, move |scope: TaskScope<Ctx>| {
        let name = name.clone();
        async move {
            let ctx = scope.context();
            ctx.enter();
            ctx.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ctx.record(&name);
            ctx.exit();
            anyhow::Ok(TaskOutput::Done)
        }
    })
}

/// A task that fails after recording its title.
pub fn failing(title: &str, message: &str) -> Task<Ctx> {
    let name = title.to_string();
    let message = message.to_string();
    Task::new(title, move |scope: TaskScope<Ctx>| {
        let name = name.clone();
        let message = message.clone();
        async move {
            scope.context().runs.fetch_add(1, Ordering::SeqCst);
            scope.context().record(&name);
            Err::<TaskOutput<Ctx>, _>(anyhow::anyhow!(message))
        }
    })
}

/// Renderer that keeps a compact trace of every event it sees.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<String>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn render(&self, event: &RenderEvent) {
        let line = match event {
            RenderEvent::RunStart {
                parent,
                total_tasks,
                ..
            } => format!("run_start:{total_tasks}:nested={}", parent.is_some()),
            RenderEvent::TaskAdded { title, .. } => format!("added:{title}"),
            RenderEvent::TaskEnabled { title, enabled, .. } => format!("enabled:{title}:{enabled}"),
            RenderEvent::TaskStart { title, .. } => format!("start:{title}"),
            RenderEvent::TaskTitle { title, .. } => format!("title:{title}"),
            RenderEvent::TaskOutput { output, .. } => format!("output:{output}"),
            RenderEvent::TaskSkipped { result, .. } => format!("skipped:{}", result.title),
            RenderEvent::TaskComplete { result, .. } => format!("complete:{}", result.title),
            RenderEvent::TaskFailed { title, fatal, .. } => format!("failed:{title}:fatal={fatal}"),
            RenderEvent::RunEnd {
                parent, success, ..
            } => format!("run_end:{success}:nested={}", parent.is_some()),
        };
        self.events.lock().unwrap().push(line);
    }
}
