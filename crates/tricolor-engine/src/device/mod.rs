//! Graphics device boundary.
//!
//! This module is responsible for:
//! - the `GraphicsDevice` capability set the frame renderer drives
//! - the shared command stream validation (`CommandList`)
//! - the wgpu implementation (Instance/Adapter/Device/Queue + Surface)
//! - an in-memory recording implementation for tests

mod capability;
mod commands;
mod error;
mod frame;
mod gpu;
mod init;
mod pipeline;
pub mod recording;
mod surface;
mod wgpu_device;

pub use capability::{
    allocate_and_fill, upload_vertices, BufferId, BufferLock, GraphicsDevice, VertexBufferAccess,
};
pub use commands::{CommandList, RenderCommand, StreamBinding};
pub use error::{DeviceError, SurfaceErrorAction};
pub use frame::{GpuFrame, RenderTarget};
pub use gpu::Gpu;
pub use init::{CullMode, GpuInit, RenderStates, VertexProcessing};
pub use recording::RecordingDevice;
pub use wgpu_device::{WgpuDevice, WgpuVertexBuffer};
