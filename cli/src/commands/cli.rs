use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use taskline_core::Concurrency;

#[derive(Parser, Debug)]
#[command(name = "taskline", version, about = "Run ordered task lists from a TOML file")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Task file to run.
    pub file: PathBuf,

    /// Number of tasks allowed to run at once: a positive integer or `unbounded`.
    /// Overrides the task file and the config.
    #[arg(long)]
    pub concurrent: Option<Concurrency>,

    /// Collect task failures and report them at the end instead of aborting.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Renderer: default, verbose, jsonl or silent.
    #[arg(long)]
    pub renderer: Option<String>,

    /// Initial context variables (KEY=VALUE). Can be specified multiple times.
    #[arg(long, action = clap::ArgAction::Append)]
    pub set: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CheckArgs {
    /// Task file to validate.
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Run(RunArgs),
    Check(CheckArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_parse() {
        let args = Args::try_parse_from([
            "taskline",
            "run",
            "tasks.toml",
            "--concurrent",
            "unbounded",
            "--continue-on-error",
            "--set",
            "TARGET=release",
        ])
        .unwrap();

        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.file, PathBuf::from("tasks.toml"));
        assert_eq!(run.concurrent, Some(Concurrency::Unbounded));
        assert!(run.continue_on_error);
        assert_eq!(run.set, vec!["TARGET=release"]);
    }

    #[test]
    fn test_zero_concurrency_is_rejected_by_the_parser() {
        let err = Args::try_parse_from(["taskline", "run", "tasks.toml", "--concurrent", "0"])
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"), "{err}");
    }
}
