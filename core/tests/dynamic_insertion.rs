mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{timed, Ctx, RecordingRenderer};
use pretty_assertions::assert_eq;
use taskline_core::{Concurrency, ListOptions, Task, TaskList, TaskOutput, TaskScope};

#[tokio::test]
async fn test_task_added_before_first_poll_runs() {
    common::init_tracing();
    let mut list: TaskList<Ctx> = TaskList::new(ListOptions::default());
    let handle = list.dynamic_handle();

    let run = list.run(Ctx::default());
    handle.add(timed("late", 1)).unwrap();
    let out = run.await.unwrap();

    assert_eq!(out.completion_order(), vec!["late"]);
    assert_eq!(out.results[0].task_id.get(), 0);
}

#[tokio::test]
async fn test_insertion_outside_a_run_is_rejected() {
    let mut list: TaskList<Ctx> = TaskList::new(ListOptions::default());

    let err = list.add_dynamic(timed("early", 1)).unwrap_err();
    assert!(err.is_invalid_state());

    list.run(Ctx::default()).await.unwrap();

    let err = list.add_dynamic(timed("too late", 1)).unwrap_err();
    assert!(err.is_invalid_state());
}

#[tokio::test]
async fn test_running_task_can_add_followups() {
    common::init_tracing();
    let seed = Task::new("discover", |scope: TaskScope<Ctx>| async move {
        for name in ["pkg-a", "pkg-b"] {
            scope.add_task(timed(name, 5))?;
        }
        anyhow::Ok(TaskOutput::Done)
    });

    let renderer = Arc::new(RecordingRenderer::default());
    let mut list = TaskList::with_tasks(vec![seed], ListOptions::default().with_concurrency(Concurrency::Unbounded))
        .with_renderer(renderer.clone());

    let out = list.run(Ctx::default()).await.unwrap();

    assert_eq!(out.results.len(), 3);
    assert_eq!(out.context.runs(), 2);
    assert_eq!(renderer.count("added:"), 2);

    let ids: Vec<u64> = out.results.iter().map(|r| r.task_id.get()).collect();
    assert!(ids.contains(&1) && ids.contains(&2), "{ids:?}");

    // Inserted tasks stay in the list.
    assert_eq!(list.titles(), vec!["discover", "pkg-a", "pkg-b"]);
}

#[tokio::test]
async fn test_inserted_tasks_respect_the_limit() {
    let seed = Task::new("fan-out", |scope: TaskScope<Ctx>| async move {
        for i in 0..5 {
            scope.add_task(timed(&format!("job-{i}"), 15))?;
        }
        anyhow::Ok(TaskOutput::Done)
    });
    let mut list = TaskList::with_tasks(
        vec![seed],
        ListOptions::default().with_concurrency(Concurrency::limited(2).unwrap()),
    );

    let out = list.run(Ctx::default()).await.unwrap();

    assert_eq!(out.context.runs(), 5);
    assert!(out.context.peak() <= 2);
}

#[tokio::test]
async fn test_inserted_task_sees_earlier_context_writes() {
    let writer = Task::new("unlock", |scope: TaskScope<Ctx>| async move {
        scope.context().unlocked.store(true, Ordering::SeqCst);
        let check = Task::new("check", |scope: TaskScope<Ctx>| async move {
            let unlocked = scope.context().unlocked.load(Ordering::SeqCst);
            anyhow::Ok(TaskOutput::Output(unlocked.to_string()))
        });
        scope.add_task(check)?;
        anyhow::Ok(TaskOutput::Done)
    });
    let mut list = TaskList::with_tasks(vec![writer], ListOptions::default());

    let out = list.run(Ctx::default()).await.unwrap();

    assert_eq!(out.results[1].output.as_deref(), Some("true"));
}

#[tokio::test]
async fn test_handle_from_another_task_feeds_the_run() {
    let mut list = TaskList::with_tasks(vec![timed("slow", 50)], ListOptions::default());
    let handle = list.dynamic_handle();

    let feeder = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        handle.add(timed("fed", 1))
    });
    let out = list.run(Ctx::default()).await.unwrap();

    assert!(feeder.await.unwrap().is_ok());
    assert_eq!(out.completion_order(), vec!["slow", "fed"]);
}
