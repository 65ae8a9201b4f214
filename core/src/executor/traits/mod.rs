pub mod renderer;
pub mod runnable;

pub use renderer::*;
pub use runnable::*;
