use crate::geometry::{PackedColor, Vertex, TRIANGLE};
use crate::transform::CameraConfig;

/// What the frame renderer draws and how the triangle evolves.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub vertices: [Vertex; 3],

    /// Added to vertex 0's packed color every frame.
    pub color_step: u32,

    pub clear_color: PackedColor,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            vertices: TRIANGLE,
            color_step: 100,
            clear_color: PackedColor::BLACK,
            camera: CameraConfig::default(),
        }
    }
}
