use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

use super::CameraConfig;

/// One full turn about the vertical axis per period.
pub const ROTATION_PERIOD_MS: u64 = 1000;

/// Rotation angle in radians for a millisecond timestamp, in `[0, 2π)`.
///
/// The timestamp is reduced modulo the period while still an integer; large raw
/// timestamps would otherwise lose precision once converted to `f32`.
#[inline]
pub fn rotation_angle(time_ms: u64) -> f32 {
    let phase = (time_ms % ROTATION_PERIOD_MS) as f32;
    phase * TAU / ROTATION_PERIOD_MS as f32
}

/// Device transform slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TransformState {
    World,
    View,
    Projection,
}

impl TransformState {
    pub const ALL: [TransformState; 3] = [Self::World, Self::View, Self::Projection];
}

/// World, view and projection for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transforms {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Transforms {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl Transforms {
    /// Computes the frame's matrices: the world spins about +Y, the camera is fixed.
    pub fn at(time_ms: u64, camera: &CameraConfig) -> Self {
        Self {
            world: Mat4::from_rotation_y(rotation_angle(time_ms)),
            view: Mat4::look_at_lh(camera.eye, camera.target, camera.up),
            projection: Mat4::perspective_lh(camera.fov_y, camera.aspect, camera.near, camera.far),
        }
    }

    #[inline]
    pub fn get(&self, state: TransformState) -> Mat4 {
        match state {
            TransformState::World => self.world,
            TransformState::View => self.view,
            TransformState::Projection => self.projection,
        }
    }

    #[inline]
    pub fn set(&mut self, state: TransformState, matrix: Mat4) {
        match state {
            TransformState::World => self.world = matrix,
            TransformState::View => self.view = matrix,
            TransformState::Projection => self.projection = matrix,
        }
    }

    /// Combined model-to-clip matrix (`projection * view * world`).
    #[inline]
    pub fn world_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.world
    }

    /// Transforms a model-space position into homogeneous clip space.
    #[inline]
    pub fn project(&self, position: Vec3) -> Vec4 {
        self.world_view_projection() * position.extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-5;

    // ── rotation_angle ────────────────────────────────────────────────────

    #[test]
    fn angle_at_period_start_is_zero() {
        assert_eq!(rotation_angle(0), 0.0);
        assert_eq!(rotation_angle(1000), 0.0);
        assert_eq!(rotation_angle(7_000), 0.0);
    }

    #[test]
    fn angle_quarter_and_half_period() {
        assert!((rotation_angle(250) - FRAC_PI_2).abs() < EPS);
        assert!((rotation_angle(500) - PI).abs() < EPS);
    }

    #[test]
    fn angle_only_depends_on_phase() {
        assert_eq!(rotation_angle(1_999), rotation_angle(999));
        assert_eq!(rotation_angle(u64::MAX), rotation_angle(u64::MAX % 1000));
    }

    #[test]
    fn angle_stays_below_full_turn() {
        let samples = [0, 1, 499, 999, 1_000, 123_456_789, u64::MAX - 1, u64::MAX];
        for t in samples {
            let a = rotation_angle(t);
            assert!((0.0..TAU).contains(&a), "t={t} angle={a}");
        }
        for t in 0..3_000u64 {
            assert!(rotation_angle(t) < TAU);
        }
    }

    // ── matrices ──────────────────────────────────────────────────────────

    #[test]
    fn world_rotates_x_toward_negative_z_after_quarter_turn() {
        let t = Transforms::at(250, &CameraConfig::default());
        let p = t.world.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS), "{p:?}");
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let cam = CameraConfig::default();
        let t = Transforms::at(0, &cam);
        assert!(t.view.transform_point3(cam.eye).abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn view_puts_target_ahead_on_positive_z() {
        let cam = CameraConfig::default();
        let t = Transforms::at(0, &cam);
        let p = t.view.transform_point3(cam.target);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 34f32.sqrt()), 1e-4), "{p:?}");
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let t = Transforms::at(0, &CameraConfig::default());

        let near = t.projection * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let far = t.projection * Vec4::new(0.0, 0.0, 100.0, 1.0);

        assert!((near.z / near.w).abs() < EPS);
        assert!((far.z / far.w - 1.0).abs() < EPS);
    }

    #[test]
    fn projection_vertical_scale_follows_fov() {
        let t = Transforms::at(0, &CameraConfig::default());
        let expected = 1.0 / (PI / 8.0).tan();
        assert!((t.projection.y_axis.y - expected).abs() < 1e-4);
        // aspect 1.0: horizontal scale matches vertical.
        assert!((t.projection.x_axis.x - expected).abs() < 1e-4);
    }

    #[test]
    fn triangle_is_on_screen_all_period() {
        let cam = CameraConfig::default();
        for ms in (0..1000).step_by(50) {
            let t = Transforms::at(ms, &cam);
            for v in crate::geometry::TRIANGLE {
                let clip = t.project(Vec3::from(v.position));
                assert!(clip.w > 0.0);
                let ndc = clip.truncate() / clip.w;
                assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "ms={ms} ndc={ndc:?}");
                assert!((0.0..=1.0).contains(&ndc.z));
            }
        }
    }

    #[test]
    fn set_and_get_round_through_slots() {
        let mut t = Transforms::default();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        for state in TransformState::ALL {
            t.set(state, m);
            assert_eq!(t.get(state), m);
        }
    }
}
