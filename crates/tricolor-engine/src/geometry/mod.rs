//! Vertex data shared between the CPU store and graphics devices.
//!
//! Conventions:
//! - positions are untransformed model-space coordinates (left-handed, +Y up)
//! - colors are packed `0xAARRGGBB`, the layout fixed-function diffuse colors use

mod color;
mod topology;
mod vertex;

pub use color::PackedColor;
pub use topology::PrimitiveTopology;
pub use vertex::{ClipVertex, Vertex, VertexFormat, VertexStore, TRIANGLE};
