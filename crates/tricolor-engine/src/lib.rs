//! Tricolor engine crate.
//!
//! A fixed-function style renderer for a single rotating, color-cycling
//! triangle: geometry, transforms, a device abstraction with wgpu and
//! in-memory backends, the frame renderer and the window runtime.

pub mod device;
pub mod geometry;
pub mod logging;
pub mod render;
pub mod time;
pub mod transform;
pub mod window;
