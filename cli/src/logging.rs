//! Tracing setup for the `taskline` binary.
//!
//! Renderers own stdout, so logs go to a per-process file and, when asked
//! for, to stderr. Nothing is ever written to stdout from here.

use std::path::PathBuf;

use taskline_core::config::LoggingConfig;
use taskline_core::error::CliError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Directive set: a non-empty `RUST_LOG` wins over the configured level.
pub fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter, CliError> {
    let directives = rust_log
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(level);
    EnvFilter::try_new(directives)
        .map_err(|e| CliError::Config(format!("invalid log filter `{directives}`: {e}")))
}

/// Log directory: the configured one, else `taskline/` under the OS temp dir.
pub fn log_dir(logging: &LoggingConfig) -> PathBuf {
    logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("taskline"))
}

/// One log file per run, so concurrent invocations never interleave.
pub fn log_file_name(pid: u32) -> String {
    format!("taskline.{pid}.log")
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must outlive
/// the run. With both sinks switched off, logging stays uninstalled.
pub fn init(logging: &LoggingConfig) -> Result<Option<WorkerGuard>, CliError> {
    if !logging.enabled || (!logging.console && !logging.file) {
        return Ok(None);
    }

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(&logging.level, rust_log.as_deref())?;

    let (file_layer, guard) = if logging.file {
        let dir = log_dir(logging);
        std::fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::never(dir, log_file_name(std::process::id()));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Config(format!("tracing already initialised: {e}")))?;

    Ok(guard)
}

/// Record how a run ended: task failures are a warning, aborts and setup
/// errors are errors.
pub fn log_outcome(result: &Result<i32, CliError>) {
    match result {
        Ok(code) => tracing::info!(code, "taskline finished"),
        Err(CliError::TasksFailed { failed }) => {
            tracing::warn!(failed, "taskline finished with failed tasks")
        }
        Err(CliError::Aborted(reason)) => tracing::error!(%reason, "taskline aborted"),
        Err(e) => tracing::error!(error = %e, "taskline failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_overrides_configured_level() {
        let filter = build_filter("info", Some("taskline_core=trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = build_filter("warn", Some("  ")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_log_dir_falls_back_to_temp() {
        let mut logging = LoggingConfig {
            directory: Some("   ".to_string()),
            ..LoggingConfig::default()
        };
        assert_eq!(log_dir(&logging), std::env::temp_dir().join("taskline"));

        logging.directory = Some("/var/log/taskline".to_string());
        assert_eq!(log_dir(&logging), PathBuf::from("/var/log/taskline"));
        assert_eq!(log_file_name(42), "taskline.42.log");
    }

    #[test]
    fn test_disabled_logging_installs_nothing() {
        let logging = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(init(&logging).unwrap().is_none());

        let logging = LoggingConfig {
            console: false,
            file: false,
            ..LoggingConfig::default()
        };
        assert!(init(&logging).unwrap().is_none());
    }
}
