use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use super::PackedColor;

bitflags! {
    /// Flexible vertex format flags describing which attributes a vertex carries.
    ///
    /// Bit values follow the classic fixed-function FVF codes.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct VertexFormat: u32 {
        /// Untransformed `[f32; 3]` position.
        const XYZ = 0x002;
        /// Packed `0xAARRGGBB` diffuse color.
        const DIFFUSE = 0x040;
    }
}

impl VertexFormat {
    /// Size in bytes of one vertex carrying these attributes.
    pub fn stride(self) -> u32 {
        let mut stride = 0;
        if self.contains(Self::XYZ) {
            stride += 12;
        }
        if self.contains(Self::DIFFUSE) {
            stride += 4;
        }
        stride
    }
}

/// Position + diffuse color vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: PackedColor,
}

impl Vertex {
    pub const FORMAT: VertexFormat = VertexFormat::XYZ.union(VertexFormat::DIFFUSE);
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Unorm8x4   // packed color, bytes b g r a
    ];

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, color: u32) -> Self {
        Self {
            position: [x, y, z],
            color: PackedColor(color),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Vertex whose position was already run through world/view/projection on the CPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ClipVertex {
    pub clip: [f32; 4],
    pub color: PackedColor,
}

impl ClipVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x4,
        1 => Unorm8x4
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ClipVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// The tutorial triangle: red bottom-left, blue bottom-right, white top.
pub const TRIANGLE: [Vertex; 3] = [
    Vertex::new(-1.0, -1.0, 0.0, 0xFFFF_0000),
    Vertex::new(1.0, -1.0, 0.0, 0xFF00_00FF),
    Vertex::new(0.0, 1.0, 0.0, 0xFFFF_FFFF),
];

/// CPU-side copy of the triangle.
///
/// The device buffer must be re-uploaded after every mutation so that the next
/// draw sees the same data as this store.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexStore {
    vertices: [Vertex; 3],
    color_step: u32,
}

impl VertexStore {
    pub fn new(vertices: [Vertex; 3], color_step: u32) -> Self {
        Self { vertices, color_step }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }

    /// Advances vertex 0's packed color by the configured step and returns it.
    pub fn advance_color(&mut self) -> PackedColor {
        let v = &mut self.vertices[0];
        v.color = v.color.wrapping_add(self.color_step);
        v.color
    }
}

impl Default for VertexStore {
    fn default() -> Self {
        Self::new(TRIANGLE, 100)
    }
}
