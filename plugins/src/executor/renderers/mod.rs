mod jsonl;
mod silent;
mod text;

pub use jsonl::JsonlRenderer;
pub use silent::SilentRenderer;
pub use text::TextRenderer;
