use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use bytemuck::Zeroable;
use glam::Vec3;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::geometry::{ClipVertex, PackedColor, Vertex, VertexFormat};
use crate::transform::Transforms;

use super::pipeline::{FixedFunctionPipelines, FixedFunctionUniform, PipelineKey};
use super::{
    BufferId, CommandList, DeviceError, Gpu, GpuInit, GraphicsDevice, RenderCommand,
    RenderStates, RenderTarget, StreamBinding, VertexBufferAccess, VertexProcessing,
};

/// [`GraphicsDevice`] backed by wgpu.
///
/// Calls are recorded into a [`CommandList`]; `present` replays the stream into
/// a single render pass on the acquired surface texture and presents it.
pub struct WgpuDevice<'w> {
    commands: CommandList,
    states: RenderStates,
    processing: VertexProcessing,

    /// Device-side state carried across replays.
    replay_transforms: Transforms,
    bound: Option<BoundStream>,
    next_buffer: u64,

    pipelines: FixedFunctionPipelines,

    /// Dropped last: every resource above was created from it.
    gpu: Gpu<'w>,
}

struct BoundStream {
    id: BufferId,
    buffer: wgpu::Buffer,
    committed: Rc<RefCell<Vec<Vertex>>>,
}

enum DrawSource {
    Stream(wgpu::Buffer),
    Processed,
}

struct PreparedDraw {
    key: PipelineKey,
    source: DrawSource,
    first_vertex: u32,
    vertex_count: u32,
    uniform_index: usize,
}

#[derive(Default)]
struct PreparedFrame {
    clear: Option<PackedColor>,
    draws: Vec<PreparedDraw>,
    uniforms: Vec<FixedFunctionUniform>,
    processed: Vec<ClipVertex>,
}

impl<'w> WgpuDevice<'w> {
    /// Creates the device for `window`.
    pub async fn create(window: &'w Window, init: GpuInit) -> Result<Self> {
        let gpu = Gpu::new(window, &init).await?;
        let pipelines = FixedFunctionPipelines::new(gpu.device(), gpu.surface_format());
        log::debug!("vertex processing: {:?}", init.vertex_processing);

        Ok(Self {
            commands: CommandList::new(),
            states: RenderStates::default(),
            processing: init.vertex_processing,
            replay_transforms: Transforms::default(),
            bound: None,
            next_buffer: 0,
            pipelines,
            gpu,
        })
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn vertex_processing(&self) -> VertexProcessing {
        self.processing
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Walks a command stream, resolving device state into concrete draws.
    ///
    /// A clear discards draws recorded before it, since it would overwrite them.
    fn prepare(&mut self, commands: &[RenderCommand]) -> PreparedFrame {
        let mut frame = PreparedFrame::default();

        for cmd in commands {
            match cmd {
                RenderCommand::Clear(color) => {
                    frame = PreparedFrame {
                        clear: Some(*color),
                        ..PreparedFrame::default()
                    };
                }
                RenderCommand::SetTransform(state, matrix) => {
                    self.replay_transforms.set(*state, *matrix);
                }
                RenderCommand::Draw {
                    topology,
                    start_vertex,
                    primitive_count,
                } => {
                    let Some(bound) = self.bound.as_ref() else { continue };
                    let vertex_count = topology.vertex_count(*primitive_count);

                    let uniform_index = frame.uniforms.len();
                    frame
                        .uniforms
                        .push(FixedFunctionUniform::new(&self.replay_transforms, &self.states));

                    let (source, first_vertex) = match self.processing {
                        VertexProcessing::Hardware => {
                            (DrawSource::Stream(bound.buffer.clone()), *start_vertex)
                        }
                        VertexProcessing::Software => {
                            let first = frame.processed.len() as u32;
                            let committed = bound.committed.borrow();
                            let start = *start_vertex as usize;
                            let end = (start + vertex_count as usize).min(committed.len());
                            frame.processed.extend(committed[start..end].iter().map(|v| {
                                ClipVertex {
                                    clip: self
                                        .replay_transforms
                                        .project(Vec3::from(v.position))
                                        .to_array(),
                                    color: v.color,
                                }
                            }));
                            (DrawSource::Processed, first)
                        }
                    };

                    frame.draws.push(PreparedDraw {
                        key: PipelineKey {
                            topology: *topology,
                            processing: self.processing,
                            cull: self.states.cull,
                        },
                        source,
                        first_vertex,
                        vertex_count,
                        uniform_index,
                    });
                }
                RenderCommand::BeginScene
                | RenderCommand::EndScene
                | RenderCommand::SetStreamSource { .. }
                | RenderCommand::SetVertexFormat(_)
                | RenderCommand::Present => {}
            }
        }

        frame
    }
}

impl Drop for WgpuDevice<'_> {
    fn drop(&mut self) {
        log::debug!("releasing graphics device");
    }
}

impl<'w> GraphicsDevice for WgpuDevice<'w> {
    type VertexBuffer = WgpuVertexBuffer;

    fn command_list(&mut self) -> &mut CommandList {
        &mut self.commands
    }

    fn set_render_states(&mut self, states: RenderStates) {
        log::debug!("render states: {states:?}");
        self.states = states;
    }

    fn create_vertex_buffer(
        &mut self,
        vertex_count: u32,
        format: VertexFormat,
    ) -> Result<WgpuVertexBuffer, DeviceError> {
        if format != Vertex::FORMAT {
            return Err(DeviceError::UnsupportedFormat(format));
        }
        if vertex_count == 0 {
            return Err(DeviceError::InvalidCall("zero-sized vertex buffer"));
        }

        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);

        let buffer = self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tricolor vertex buffer"),
            size: vertex_count as u64 * format.stride() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::debug!("allocated vertex buffer {id:?}: {vertex_count} vertices");

        Ok(WgpuVertexBuffer {
            id,
            format,
            mapped: vec![Vertex::zeroed(); vertex_count as usize],
            committed: Rc::new(RefCell::new(vec![Vertex::zeroed(); vertex_count as usize])),
            locked: false,
            buffer,
            queue: self.gpu.queue().clone(),
        })
    }

    fn set_stream_source(
        &mut self,
        buffer: &WgpuVertexBuffer,
        stride: u32,
    ) -> Result<(), DeviceError> {
        self.commands.set_stream_source(StreamBinding {
            buffer: buffer.id,
            stride,
            vertex_count: buffer.vertex_count(),
        })?;
        self.bound = Some(BoundStream {
            id: buffer.id,
            buffer: buffer.buffer.clone(),
            committed: Rc::clone(&buffer.committed),
        });
        Ok(())
    }

    fn release_vertex_buffer(&mut self, buffer: WgpuVertexBuffer) {
        self.commands.unbind(buffer.id);
        if self.bound.as_ref().is_some_and(|b| b.id == buffer.id) {
            self.bound = None;
        }
        drop(buffer);
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        let commands = self.commands.finish();
        let prepared = self.prepare(&commands);

        for draw in &prepared.draws {
            self.pipelines.ensure_pipeline(self.gpu.device(), draw.key);
        }
        self.pipelines
            .upload_uniforms(self.gpu.device(), self.gpu.queue(), &prepared.uniforms);
        self.pipelines
            .upload_processed(self.gpu.device(), self.gpu.queue(), &prepared.processed);

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                return Err(DeviceError::from(action));
            }
        };

        {
            let target = RenderTarget::new(&mut frame.encoder, &frame.view);
            encode_pass(target, &self.pipelines, &prepared);
        }

        self.gpu.submit(frame);
        Ok(())
    }
}

fn encode_pass(
    target: RenderTarget<'_>,
    pipelines: &FixedFunctionPipelines,
    frame: &PreparedFrame,
) {
    let load = frame
        .clear
        .map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(c.to_wgpu()));

    let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("tricolor frame pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    let Some(bind_group) = pipelines.bind_group() else { return };

    for draw in &frame.draws {
        let Some(pipeline) = pipelines.pipeline(&draw.key) else { continue };
        let vbo = match &draw.source {
            DrawSource::Stream(buffer) => buffer,
            DrawSource::Processed => match pipelines.processed_vbo() {
                Some(buffer) => buffer,
                None => continue,
            },
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[pipelines.uniform_offset(draw.uniform_index)]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.draw(draw.first_vertex..draw.first_vertex + draw.vertex_count, 0..1);
    }
}

/// Vertex buffer created by [`WgpuDevice`].
///
/// Writes go to a CPU copy while locked and reach the GPU buffer at unlock.
pub struct WgpuVertexBuffer {
    id: BufferId,
    format: VertexFormat,
    mapped: Vec<Vertex>,
    /// Last unlocked contents; read by software vertex processing.
    committed: Rc<RefCell<Vec<Vertex>>>,
    locked: bool,
    buffer: wgpu::Buffer,
    queue: wgpu::Queue,
}

impl VertexBufferAccess for WgpuVertexBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn vertex_count(&self) -> u32 {
        self.mapped.len() as u32
    }

    fn format(&self) -> VertexFormat {
        self.format
    }

    fn lock(&mut self) -> Result<(), DeviceError> {
        if self.locked {
            return Err(DeviceError::AlreadyLocked);
        }
        self.locked = true;
        Ok(())
    }

    fn locked_mut(&mut self) -> Option<&mut [Vertex]> {
        self.locked.then_some(self.mapped.as_mut_slice())
    }

    fn unlock(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.committed.borrow_mut().copy_from_slice(&self.mapped);
        self.queue
            .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.mapped));
    }
}

impl Drop for WgpuVertexBuffer {
    fn drop(&mut self) {
        log::debug!("releasing vertex buffer {:?}", self.id);
    }
}
