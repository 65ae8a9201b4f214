use clap::Parser;
use taskline_cli::app;
use taskline_cli::commands::cli;
use taskline_cli::logging;
use taskline_core::error;

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let cfg = taskline_core::config::load_default()
        .map_err(|e| error::CliError::Config(e.to_string()))?;
    // Must drop before process::exit so the file writer flushes.
    let _log_guard = logging::init(&cfg.logging)?;

    let result = match args.command {
        cli::Commands::Run(run_args) => app::run_file(&cfg, run_args).await,
        cli::Commands::Check(check_args) => app::check_file(check_args),
    };
    logging::log_outcome(&result);
    result
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 1: one or more tasks failed, or the run was aborted
    // 11: config / task file error
    // 20: IO error
    // 50: internal/uncategorized
    match e {
        error::CliError::TasksFailed { .. } | error::CliError::Aborted(_) => 1,
        error::CliError::Config(_) | error::CliError::TaskFile(_) => 11,
        error::CliError::Scheduler(se) => match se {
            error::SchedulerError::Config(_) => 11,
            error::SchedulerError::InvalidState(_) => 50,
        },
        error::CliError::Io(_) => 20,
        error::CliError::Anyhow(_) => 50,
    }
}
