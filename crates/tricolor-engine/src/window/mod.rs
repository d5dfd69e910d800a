//! Window and message loop.
//!
//! Owns the `winit` EventLoop and the window, and drives the render context.
//! The per-iteration decisions live in `loop_control` and work over any
//! `GraphicsDevice`.

mod loop_control;
mod runtime;

pub use loop_control::{close_window, drive_frame, start_rendering, LoopAction};
pub use runtime::{Runtime, RuntimeConfig};
