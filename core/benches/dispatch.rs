//! Scheduler overhead benchmarks
//!
//! Measures the dispatch state machine on its own and a full run of no-op
//! tasks, so scheduling cost can be compared across concurrency degrees.

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use taskline_core::executor::{Dispatch, TaskTable};
use taskline_core::{
    Concurrency, ListOptions, Runnable, Task, TaskFailure, TaskList, TaskOutcome, TaskOutput,
    TaskScope,
};

struct Noop;

#[async_trait]
impl Runnable<()> for Noop {
    fn title(&self) -> &str {
        "noop"
    }

    async fn run(&self, _scope: TaskScope<()>) -> Result<TaskOutcome, TaskFailure> {
        Ok(TaskOutcome::Completed { output: None })
    }
}

/// Register, dispatch and complete every handle without running anything.
fn bench_table_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_dispatch");

    for &limit in &[1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::new("limit", limit), &limit, |b, &limit| {
            b.iter(|| {
                let mut table = TaskTable::new(Concurrency::limited(limit).unwrap());
                for _ in 0..1_000 {
                    table.register(Arc::new(Noop));
                }
                while !table.is_idle() {
                    for decision in table.dispatch(&()) {
                        if let Dispatch::Run { id, .. } = decision {
                            table.complete(id);
                        }
                    }
                }
                black_box(table.done_count())
            })
        });
    }

    group.finish();
}

/// Full runs of no-op tasks on a multi-threaded runtime.
fn bench_list_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_run");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for concurrency in [Concurrency::SEQUENTIAL, Concurrency::Unbounded] {
        group.bench_function(BenchmarkId::new("tasks_500", concurrency), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let tasks = (0..500).map(|i| {
                        Task::new(format!("task {i}"), |_scope: TaskScope<()>| async {
                            anyhow::Ok(TaskOutput::Done)
                        })
                    });
                    let mut list =
                        TaskList::with_tasks(tasks, ListOptions::default().with_concurrency(concurrency));
                    black_box(list.run(()).await.unwrap().results.len())
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_table_dispatch, bench_list_run);
criterion_main!(benches);
