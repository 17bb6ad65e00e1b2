pub mod renderer;

pub use renderer::{AgentOverlay, Renderer, SPARKLINE_HISTORY};
