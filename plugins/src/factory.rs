use std::sync::Arc;

use taskline_core::error::SchedulerError;
use taskline_core::executor::traits::Renderer;
use taskline_core::ProgressRenderer;
use tracing::debug;

use crate::executor::{JsonlRenderer, SilentRenderer, TextRenderer};

/// Build the renderer named by `kind`.
///
/// `default` draws progress bars on an interactive terminal and falls back to
/// `non_tty_kind` when stdout is redirected.
pub fn build_renderer(kind: &str, non_tty_kind: &str) -> Result<Arc<dyn Renderer>, SchedulerError> {
    build_renderer_for(kind, non_tty_kind, atty::is(atty::Stream::Stdout))
}

pub fn build_renderer_for(
    kind: &str,
    non_tty_kind: &str,
    is_tty: bool,
) -> Result<Arc<dyn Renderer>, SchedulerError> {
    let renderer: Arc<dyn Renderer> = match kind.trim().to_ascii_lowercase().as_str() {
        "default" if is_tty => Arc::new(ProgressRenderer::new()),
        "default" => match non_tty_kind.trim().to_ascii_lowercase().as_str() {
            // Progress bars make no sense on a pipe.
            "default" => Arc::new(TextRenderer::default()),
            other => return build_renderer_for(other, "verbose", false),
        },
        "verbose" | "text" => Arc::new(TextRenderer::default()),
        "jsonl" | "json" => Arc::new(JsonlRenderer::new(false)),
        "silent" | "none" => Arc::new(SilentRenderer),
        other => {
            return Err(SchedulerError::Config(format!(
                "unknown renderer '{other}' (expected default, verbose, jsonl or silent)"
            )))
        }
    };
    debug!(kind, renderer = renderer.name(), is_tty, "build_renderer");
    Ok(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_progress_on_a_terminal() {
        let renderer = build_renderer_for("default", "verbose", true).unwrap();
        assert_eq!(renderer.name(), "default");
    }

    #[test]
    fn test_default_falls_back_off_a_terminal() {
        let renderer = build_renderer_for("default", "jsonl", false).unwrap();
        assert_eq!(renderer.name(), "jsonl");

        let renderer = build_renderer_for("default", "default", false).unwrap();
        assert_eq!(renderer.name(), "verbose");
    }

    #[test]
    fn test_named_renderers_ignore_the_terminal() {
        assert_eq!(build_renderer_for("silent", "verbose", true).unwrap().name(), "silent");
        assert_eq!(build_renderer_for("Verbose", "jsonl", false).unwrap().name(), "verbose");
    }

    #[test]
    fn test_unknown_renderer_is_a_config_error() {
        let err = build_renderer_for("fancy", "verbose", true).err().unwrap();
        assert!(matches!(err, SchedulerError::Config(_)));

        let err = build_renderer_for("default", "fancy", false).err().unwrap();
        assert!(err.to_string().contains("fancy"));
    }
}
