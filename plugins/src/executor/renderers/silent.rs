use taskline_core::executor::traits::{RenderEvent, Renderer};

/// Renderer that discards every event.
#[derive(Debug, Default)]
pub struct SilentRenderer;

impl Renderer for SilentRenderer {
    fn name(&self) -> &str {
        "silent"
    }

    fn render(&self, _event: &RenderEvent) {}
}
