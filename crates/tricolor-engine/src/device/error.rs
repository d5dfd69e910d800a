use thiserror::Error;

use crate::geometry::VertexFormat;

/// Failure reported across the `GraphicsDevice` boundary.
///
/// A failed frame step skips the rest of the scene and the frame is still
/// presented. Only a [fatal](DeviceError::is_fatal) present ends rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Call made in a state that does not allow it (e.g. nested scene begin).
    #[error("invalid call: {0}")]
    InvalidCall(&'static str),

    #[error("unsupported vertex format {0:?}")]
    UnsupportedFormat(VertexFormat),

    /// Access past the end of a vertex buffer.
    #[error("vertex range {start}..{end} exceeds buffer of {len} vertices")]
    BufferOverrun { start: u32, end: u32, len: u32 },

    #[error("vertex buffer is already locked")]
    AlreadyLocked,

    #[error("vertex buffer is not locked")]
    NotLocked,

    /// Surface was lost or outdated and has been reconfigured; retry next frame.
    #[error("surface lost; reconfigured")]
    SurfaceLost,

    /// Surface acquisition timed out; the frame is skipped.
    #[error("surface acquisition timed out")]
    SurfaceTimeout,

    #[error("device out of memory")]
    OutOfMemory,

    /// The device or buffer was already released.
    #[error("device released")]
    Released,
}

impl DeviceError {
    /// Errors that end rendering when reported by `present`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory | Self::Released)
    }
}

/// How the device reacted to a failed surface acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Swapchain rebuilt; the next present can succeed.
    Reconfigured,
    /// Nothing to show this frame.
    SkipFrame,
    /// Out of memory; stop rendering.
    Fatal,
}

impl From<SurfaceErrorAction> for DeviceError {
    fn from(action: SurfaceErrorAction) -> Self {
        match action {
            SurfaceErrorAction::Reconfigured => Self::SurfaceLost,
            SurfaceErrorAction::SkipFrame => Self::SurfaceTimeout,
            SurfaceErrorAction::Fatal => Self::OutOfMemory,
        }
    }
}
