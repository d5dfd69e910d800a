use glam::Vec3;

/// Fixed camera placement and lens.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,

    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    /// Five units back, three up, looking at the origin through a 45° lens.
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, -5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 1.0,
            near: 1.0,
            far: 100.0,
        }
    }
}
