pub mod renderers;

pub use renderers::{JsonlRenderer, SilentRenderer, TextRenderer};
