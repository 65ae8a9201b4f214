//! Wires a task file, the loaded config and the command-line flags into a
//! `TaskList<ShellContext>` and runs it.
use std::sync::Arc;

use taskline_core::config::AppConfig;
use taskline_core::error::CliError;
use taskline_core::{ListOptions, RunError, Task, TaskList, TaskOutput, TaskScope};
use taskline_plugins::factory::build_renderer;

use crate::commands::cli::{CheckArgs, RunArgs};
use crate::context::ShellContext;
use crate::shell;
use crate::taskfile::{FileOptions, TaskFile, TaskSpec};

/// Config defaults, then the task file's `[options]`, then CLI flags.
pub fn resolve_options(cfg: &AppConfig, file: &FileOptions, args: &RunArgs) -> ListOptions {
    let mut options = cfg.runner.to_list_options();
    if let Some(concurrency) = file.concurrent {
        options.concurrency = concurrency;
    }
    if file.exit_on_error.is_some() {
        options.exit_on_error = file.exit_on_error;
    }
    if let Some(concurrency) = args.concurrent {
        options.concurrency = concurrency;
    }
    if args.continue_on_error {
        options.exit_on_error = Some(false);
    }
    options
}

pub fn build_list(specs: &[TaskSpec], options: ListOptions) -> TaskList<ShellContext> {
    let mut list = TaskList::new(options);
    for spec in specs {
        list.add(build_task(Arc::new(spec.clone())));
    }
    list
}

pub fn build_task(spec: Arc<TaskSpec>) -> Task<ShellContext> {
    let work_spec = Arc::clone(&spec);
    let mut task = Task::new(spec.title.clone(), move |scope: TaskScope<ShellContext>| {
        let spec = Arc::clone(&work_spec);
        async move { run_task(&spec, &scope).await }
    });

    if let Some(var) = spec.enabled_if.clone() {
        task = task.enabled(move |ctx: &ShellContext| ctx.is_set(&var));
    }
    if let Some(var) = spec.skip_if.clone() {
        task = task.skip(move |ctx: &ShellContext| ctx.is_set(&var).then(|| format!("{var} is set")));
    }
    if let Some(exit_on_error) = spec.exit_on_error {
        task = task.exit_on_error(exit_on_error);
    }
    task
}

async fn run_task(
    spec: &TaskSpec,
    scope: &TaskScope<ShellContext>,
) -> anyhow::Result<TaskOutput<ShellContext>> {
    if let Some(command) = &spec.run {
        let env = scope.context().env();
        let output = shell::run(command, &env, |line| scope.set_output(line)).await?;

        if let Some(var) = &spec.capture {
            scope.context().set(var, output.stdout.trim());
        }
        if spec.expand {
            for line in output.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
                scope.add_task(build_task(Arc::new(TaskSpec::command(line))))?;
            }
        }
    }

    if spec.subtasks.is_empty() {
        return Ok(TaskOutput::Done);
    }
    let options = ListOptions::default().with_concurrency(spec.concurrent.unwrap_or_default());
    Ok(TaskOutput::Subtasks(build_list(&spec.subtasks, options)))
}

#[tracing::instrument(name = "cli.run_file", skip(cfg, args), fields(file = %args.file.display()))]
pub async fn run_file(cfg: &AppConfig, args: RunArgs) -> Result<i32, CliError> {
    let file = TaskFile::load(&args.file)?;
    let options = resolve_options(cfg, &file.options, &args);
    let renderer_kind = args.renderer.as_deref().unwrap_or(&cfg.runner.renderer);
    let renderer = build_renderer(renderer_kind, &cfg.runner.non_tty_renderer)?;
    let context = ShellContext::from_assignments(&args.set)?;

    tracing::info!(
        tasks = file.tasks.len(),
        concurrency = %options.concurrency,
        exit_on_error = ?options.exit_on_error,
        renderer = renderer.name(),
        "starting task file"
    );

    let mut list = build_list(&file.tasks, options).with_renderer(renderer);
    match list.run(context).await {
        Ok(output) => {
            tracing::info!(
                results = output.results.len(),
                duration_ms = output.duration_ms,
                "task file finished"
            );
            Ok(0)
        }
        Err(RunError::Aggregate { errors, .. }) => {
            for failure in &errors {
                eprintln!("✖ {failure}");
            }
            Err(CliError::TasksFailed {
                failed: errors.len(),
            })
        }
        Err(RunError::Fatal { failure, .. }) => Err(CliError::Aborted(failure.to_string())),
    }
}

pub fn check_file(args: CheckArgs) -> Result<i32, CliError> {
    let file = TaskFile::load(&args.file)?;
    print!("{}", file.outline());
    println!("{} top-level task(s), file is valid", file.tasks.len());
    Ok(0)
}
