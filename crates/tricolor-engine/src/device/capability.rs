use glam::Mat4;

use crate::geometry::{PackedColor, PrimitiveTopology, Vertex, VertexFormat};
use crate::transform::TransformState;

use super::{CommandList, DeviceError, RenderStates, StreamBinding};

/// Device-unique vertex buffer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Vertex buffer that can be locked for CPU writes.
///
/// Contents written while locked become device-visible at `unlock`.
/// Prefer [`BufferLock`] over calling `lock`/`unlock` directly.
pub trait VertexBufferAccess {
    fn id(&self) -> BufferId;
    fn vertex_count(&self) -> u32;
    fn format(&self) -> VertexFormat;

    fn lock(&mut self) -> Result<(), DeviceError>;

    /// Writable region while locked, `None` otherwise.
    fn locked_mut(&mut self) -> Option<&mut [Vertex]>;

    /// Commits the locked region. No-op when not locked.
    fn unlock(&mut self);
}

/// Fixed-function device capability set.
///
/// Implementations supply buffer creation, render state and presentation; the
/// per-frame calls default to recording into the device's [`CommandList`],
/// which enforces scene and binding rules identically for every backend.
pub trait GraphicsDevice {
    type VertexBuffer: VertexBufferAccess;

    fn command_list(&mut self) -> &mut CommandList;

    fn set_render_states(&mut self, states: RenderStates);

    fn create_vertex_buffer(
        &mut self,
        vertex_count: u32,
        format: VertexFormat,
    ) -> Result<Self::VertexBuffer, DeviceError>;

    /// Releases `buffer`, forgetting any stream binding that refers to it.
    fn release_vertex_buffer(&mut self, buffer: Self::VertexBuffer) {
        self.command_list().unbind(buffer.id());
        drop(buffer);
    }

    /// Submits everything recorded since the previous present and shows the frame.
    fn present(&mut self) -> Result<(), DeviceError>;

    fn clear(&mut self, color: PackedColor) -> Result<(), DeviceError> {
        self.command_list().clear(color)
    }

    fn begin_scene(&mut self) -> Result<(), DeviceError> {
        self.command_list().begin_scene()
    }

    fn end_scene(&mut self) -> Result<(), DeviceError> {
        self.command_list().end_scene()
    }

    fn set_transform(&mut self, state: TransformState, matrix: Mat4) -> Result<(), DeviceError> {
        self.command_list().set_transform(state, matrix)
    }

    fn set_stream_source(
        &mut self,
        buffer: &Self::VertexBuffer,
        stride: u32,
    ) -> Result<(), DeviceError> {
        let binding = StreamBinding {
            buffer: buffer.id(),
            stride,
            vertex_count: buffer.vertex_count(),
        };
        self.command_list().set_stream_source(binding)
    }

    fn set_vertex_format(&mut self, format: VertexFormat) -> Result<(), DeviceError> {
        self.command_list().set_vertex_format(format)
    }

    fn draw_primitive(
        &mut self,
        topology: PrimitiveTopology,
        start_vertex: u32,
        primitive_count: u32,
    ) -> Result<(), DeviceError> {
        self.command_list()
            .draw(topology, start_vertex, primitive_count)
            .map(|_| ())
    }
}

/// Scoped lock over a vertex buffer.
///
/// The buffer is writable only through this guard and is unlocked when the guard
/// drops, on every path. Holding the guard borrows the buffer mutably, so it
/// cannot be bound for drawing while locked.
pub struct BufferLock<'a, B: VertexBufferAccess + ?Sized> {
    buffer: &'a mut B,
}

impl<'a, B: VertexBufferAccess + ?Sized> BufferLock<'a, B> {
    pub fn acquire(buffer: &'a mut B) -> Result<Self, DeviceError> {
        buffer.lock()?;
        Ok(Self { buffer })
    }

    /// Copies `src` to the start of the locked region.
    pub fn write(&mut self, src: &[Vertex]) -> Result<(), DeviceError> {
        let region = self.buffer.locked_mut().ok_or(DeviceError::NotLocked)?;
        if src.len() > region.len() {
            return Err(DeviceError::BufferOverrun {
                start: 0,
                end: src.len() as u32,
                len: region.len() as u32,
            });
        }
        region[..src.len()].copy_from_slice(src);
        Ok(())
    }
}

impl<B: VertexBufferAccess + ?Sized> Drop for BufferLock<'_, B> {
    fn drop(&mut self) {
        self.buffer.unlock();
    }
}

/// Replaces a buffer's contents with `vertices` (lock, copy, unlock).
pub fn upload_vertices<B: VertexBufferAccess + ?Sized>(
    buffer: &mut B,
    vertices: &[Vertex],
) -> Result<(), DeviceError> {
    let mut lock = BufferLock::acquire(buffer)?;
    lock.write(vertices)
}

/// Allocates a buffer sized for exactly `vertices` and fills it.
pub fn allocate_and_fill<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    vertices: &[Vertex],
) -> Result<D::VertexBuffer, DeviceError> {
    let mut buffer = device.create_vertex_buffer(vertices.len() as u32, Vertex::FORMAT)?;
    upload_vertices(&mut buffer, vertices)?;
    Ok(buffer)
}
