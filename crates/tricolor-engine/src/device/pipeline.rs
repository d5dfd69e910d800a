//! wgpu pipelines emulating the fixed-function transform and color stages.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::geometry::{ClipVertex, PrimitiveTopology, Vertex};
use crate::transform::Transforms;

use super::{CullMode, RenderStates, VertexProcessing};

/// Per-draw uniform block; layout matches `FixedFunction` in the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct FixedFunctionUniform {
    world: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    ambient: [f32; 4],
    flags: [u32; 4],
}

impl FixedFunctionUniform {
    pub(super) fn new(transforms: &Transforms, states: &RenderStates) -> Self {
        Self {
            world: transforms.world.to_cols_array_2d(),
            view: transforms.view.to_cols_array_2d(),
            projection: transforms.projection.to_cols_array_2d(),
            ambient: states.ambient.to_rgba_f32(),
            flags: [states.lighting as u32, 0, 0, 0],
        }
    }
}

const UNIFORM_BINDING_SIZE: wgpu::BufferSize =
    match wgpu::BufferSize::new(size_of::<FixedFunctionUniform>() as u64) {
        Some(size) => size,
        None => panic!("FixedFunctionUniform must not be zero-sized"),
    };

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub topology: PrimitiveTopology,
    pub processing: VertexProcessing,
    pub cull: CullMode,
}

/// Shader, layouts, per-key pipelines and the growable per-frame buffers.
pub(super) struct FixedFunctionPipelines {
    format: wgpu::TextureFormat,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    uniform_stride: u64,
    ubo: Option<wgpu::Buffer>,
    ubo_capacity: usize,
    bind_group: Option<wgpu::BindGroup>,

    processed_vbo: Option<wgpu::Buffer>,
    processed_capacity: usize,
}

impl FixedFunctionPipelines {
    pub(super) fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tricolor fixed-function shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/fixed_function.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tricolor fixed-function bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(UNIFORM_BINDING_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tricolor fixed-function pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride =
            wgpu::util::align_to(std::mem::size_of::<FixedFunctionUniform>() as u64, align);

        Self {
            format,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_stride,
            ubo: None,
            ubo_capacity: 0,
            bind_group: None,
            processed_vbo: None,
            processed_capacity: 0,
        }
    }

    pub(super) fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub(super) fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    pub(super) fn processed_vbo(&self) -> Option<&wgpu::Buffer> {
        self.processed_vbo.as_ref()
    }

    /// Dynamic offset of the `index`-th uniform written by `upload_uniforms`.
    pub(super) fn uniform_offset(&self, index: usize) -> u32 {
        (index as u64 * self.uniform_stride) as u32
    }

    pub(super) fn ensure_pipeline(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        let (entry_point, layout) = match key.processing {
            VertexProcessing::Hardware => ("vs_transform", Vertex::layout()),
            VertexProcessing::Software => ("vs_pretransformed", ClipVertex::layout()),
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tricolor fixed-function pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                buffers: &[layout],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: key.topology.to_wgpu(),
                strip_index_format: None,
                // Left-handed convention: clockwise triangles face the viewer.
                front_face: wgpu::FrontFace::Cw,
                cull_mode: key.cull.to_wgpu(),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("created fixed-function pipeline for {key:?}");
        self.pipelines.insert(key, pipeline);
    }

    pub(super) fn upload_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &[FixedFunctionUniform],
    ) {
        if uniforms.is_empty() {
            return;
        }
        self.ensure_uniform_capacity(device, uniforms.len());
        let Some(ubo) = self.ubo.as_ref() else { return };

        let stride = self.uniform_stride as usize;
        let mut bytes = vec![0u8; stride * uniforms.len()];
        for (i, u) in uniforms.iter().enumerate() {
            let raw = bytemuck::bytes_of(u);
            bytes[i * stride..i * stride + raw.len()].copy_from_slice(raw);
        }
        queue.write_buffer(ubo, 0, &bytes);
    }

    pub(super) fn upload_processed(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[ClipVertex],
    ) {
        if vertices.is_empty() {
            return;
        }
        self.ensure_processed_capacity(device, vertices.len());
        let Some(vbo) = self.processed_vbo.as_ref() else { return };
        queue.write_buffer(vbo, 0, bytemuck::cast_slice(vertices));
    }

    fn ensure_uniform_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.ubo_capacity && self.ubo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(4);
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tricolor fixed-function ubo"),
            size: new_cap as u64 * self.uniform_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tricolor fixed-function bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(UNIFORM_BINDING_SIZE),
                }),
            }],
        });

        self.ubo = Some(ubo);
        self.bind_group = Some(bind_group);
        self.ubo_capacity = new_cap;
    }

    fn ensure_processed_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.processed_capacity && self.processed_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(16);
        self.processed_vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tricolor processed vbo"),
            size: (new_cap * std::mem::size_of::<ClipVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.processed_capacity = new_cap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn uniform_matches_shader_block_size() {
        // 3 * mat4x4<f32> + vec4<f32> + vec4<u32>
        assert_eq!(std::mem::size_of::<FixedFunctionUniform>(), 3 * 64 + 16 + 16);
        assert_eq!(UNIFORM_BINDING_SIZE.get(), 224);
    }

    #[test]
    fn uniform_carries_lighting_flag() {
        let t = Transforms::default();
        let lit = FixedFunctionUniform::new(&t, &RenderStates::default());
        let unlit = FixedFunctionUniform::new(&t, &RenderStates::unlit_two_sided());
        assert_eq!(lit.flags[0], 1);
        assert_eq!(unlit.flags[0], 0);
    }

    #[test]
    fn uniform_matrices_are_column_major() {
        let mut t = Transforms::default();
        t.world = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let u = FixedFunctionUniform::new(&t, &RenderStates::default());
        assert_eq!(u.world[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
