//! World/view/projection setup.
//!
//! Everything here is a pure function of a time sample and camera constants.
//! Matrices are left-handed with a `[0, 1]` depth range, matching the classic
//! fixed-function conventions, and use glam's column-vector layout.

mod camera;
mod matrices;

pub use camera::CameraConfig;
pub use matrices::{rotation_angle, TransformState, Transforms, ROTATION_PERIOD_MS};
