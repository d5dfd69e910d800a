//! Frame rendering.
//!
//! `RenderContext` owns the device, the triangle's vertex buffer and the CPU
//! vertex store; `render_frame` drives one frame through any `GraphicsDevice`.

mod config;
mod context;
mod frame;

pub use config::SceneConfig;
pub use context::RenderContext;
pub use frame::{FrameReport, FrameStep, StepFailure};
