use glam::Mat4;

use crate::geometry::{PackedColor, PrimitiveTopology, Vertex, VertexFormat};
use crate::transform::{TransformState, Transforms};

use super::{BufferId, DeviceError};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Clear(PackedColor),
    BeginScene,
    SetTransform(TransformState, Mat4),
    SetStreamSource { buffer: BufferId, stride: u32 },
    SetVertexFormat(VertexFormat),
    Draw {
        topology: PrimitiveTopology,
        start_vertex: u32,
        primitive_count: u32,
    },
    EndScene,
    Present,
}

/// Vertex buffer bound for drawing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamBinding {
    pub buffer: BufferId,
    pub stride: u32,
    pub vertex_count: u32,
}

/// Ordered command stream for one frame plus the device state it implies.
///
/// Validation mirrors a fixed-function device:
/// - scenes do not nest; draws happen only inside a scene
/// - a draw needs a bound stream and a vertex format of matching stride
/// - the drawn vertex range must fit in the bound buffer
///
/// Bindings and transforms persist across frames; the command stream does not.
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
    in_scene: bool,
    stream: Option<StreamBinding>,
    format: Option<VertexFormat>,
    transforms: Transforms,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last present.
    #[inline]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    #[inline]
    pub fn in_scene(&self) -> bool {
        self.in_scene
    }

    #[inline]
    pub fn stream(&self) -> Option<StreamBinding> {
        self.stream
    }

    #[inline]
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    pub fn clear(&mut self, color: PackedColor) -> Result<(), DeviceError> {
        self.commands.push(RenderCommand::Clear(color));
        Ok(())
    }

    pub fn begin_scene(&mut self) -> Result<(), DeviceError> {
        if self.in_scene {
            return Err(DeviceError::InvalidCall("begin_scene inside an open scene"));
        }
        self.in_scene = true;
        self.commands.push(RenderCommand::BeginScene);
        Ok(())
    }

    pub fn end_scene(&mut self) -> Result<(), DeviceError> {
        if !self.in_scene {
            return Err(DeviceError::InvalidCall("end_scene without begin_scene"));
        }
        self.in_scene = false;
        self.commands.push(RenderCommand::EndScene);
        Ok(())
    }

    pub fn set_transform(&mut self, state: TransformState, matrix: Mat4) -> Result<(), DeviceError> {
        if !matrix.is_finite() {
            return Err(DeviceError::InvalidCall("non-finite transform"));
        }
        self.transforms.set(state, matrix);
        self.commands.push(RenderCommand::SetTransform(state, matrix));
        Ok(())
    }

    pub fn set_stream_source(&mut self, binding: StreamBinding) -> Result<(), DeviceError> {
        if binding.stride == 0 {
            return Err(DeviceError::InvalidCall("zero stream stride"));
        }
        self.stream = Some(binding);
        self.commands.push(RenderCommand::SetStreamSource {
            buffer: binding.buffer,
            stride: binding.stride,
        });
        Ok(())
    }

    pub fn set_vertex_format(&mut self, format: VertexFormat) -> Result<(), DeviceError> {
        if format != Vertex::FORMAT {
            return Err(DeviceError::UnsupportedFormat(format));
        }
        self.format = Some(format);
        self.commands.push(RenderCommand::SetVertexFormat(format));
        Ok(())
    }

    /// Validates and records a non-indexed draw.
    ///
    /// Returns the number of vertices the draw reads.
    pub fn draw(
        &mut self,
        topology: PrimitiveTopology,
        start_vertex: u32,
        primitive_count: u32,
    ) -> Result<u32, DeviceError> {
        if !self.in_scene {
            return Err(DeviceError::InvalidCall("draw outside a scene"));
        }
        if primitive_count == 0 {
            return Err(DeviceError::InvalidCall("draw with zero primitives"));
        }
        let stream = self
            .stream
            .ok_or(DeviceError::InvalidCall("draw without a stream source"))?;
        let format = self
            .format
            .ok_or(DeviceError::InvalidCall("draw without a vertex format"))?;
        if format.stride() != stream.stride {
            return Err(DeviceError::InvalidCall("stream stride does not match vertex format"));
        }

        let vertex_count = topology.vertex_count(primitive_count);
        let end = start_vertex.saturating_add(vertex_count);
        if end > stream.vertex_count {
            return Err(DeviceError::BufferOverrun {
                start: start_vertex,
                end,
                len: stream.vertex_count,
            });
        }

        self.commands.push(RenderCommand::Draw {
            topology,
            start_vertex,
            primitive_count,
        });
        Ok(vertex_count)
    }

    /// Drops the binding for a buffer that is going away.
    pub fn unbind(&mut self, buffer: BufferId) {
        if self.stream.is_some_and(|s| s.buffer == buffer) {
            self.stream = None;
        }
    }

    /// Closes the frame: appends `Present` and hands the stream to the caller.
    ///
    /// A scene left open is closed implicitly so the next frame can begin one.
    pub fn finish(&mut self) -> Vec<RenderCommand> {
        if self.in_scene {
            log::warn!("present called inside an open scene; closing it");
            self.in_scene = false;
            self.commands.push(RenderCommand::EndScene);
        }
        self.commands.push(RenderCommand::Present);
        std::mem::take(&mut self.commands)
    }
}
