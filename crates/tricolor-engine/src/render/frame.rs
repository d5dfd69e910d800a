use std::collections::HashSet;
use std::fmt;

use crate::device::{upload_vertices, DeviceError, GraphicsDevice, VertexBufferAccess};
use crate::geometry::{PrimitiveTopology, Vertex};
use crate::time::FrameTime;
use crate::transform::{TransformState, Transforms};

use super::RenderContext;

/// Steps of one frame, in execution order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameStep {
    Clear,
    Upload,
    BeginScene,
    SetTransforms,
    Draw,
    EndScene,
    Present,
}

impl fmt::Display for FrameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clear => "clear",
            Self::Upload => "vertex upload",
            Self::BeginScene => "begin scene",
            Self::SetTransforms => "set transforms",
            Self::Draw => "draw",
            Self::EndScene => "end scene",
            Self::Present => "present",
        };
        f.write_str(name)
    }
}

/// A step that failed during a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: FrameStep,
    pub error: DeviceError,
}

/// What happened during one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub uploaded: bool,
    pub drawn: bool,
    pub presented: bool,
    pub failures: Vec<StepFailure>,
}

impl FrameReport {
    /// True when no later frame can succeed: the device failed to present
    /// with an unrecoverable error, or the context was already released.
    ///
    /// Failures of earlier steps only cost the current frame.
    pub fn is_fatal(&self) -> bool {
        self.failures.iter().any(|f| match f.step {
            FrameStep::Present => f.error.is_fatal(),
            _ => f.error == DeviceError::Released,
        })
    }

    /// Logs a failed step (warn on first occurrence, trace afterwards) and keeps it.
    fn record<T>(
        &mut self,
        warned: &mut HashSet<FrameStep>,
        step: FrameStep,
        result: Result<T, DeviceError>,
    ) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(error) => {
                if warned.insert(step) {
                    log::warn!("{step} failed: {error}");
                } else {
                    log::trace!("{step} failed: {error}");
                }
                self.failures.push(StepFailure { step, error });
                None
            }
        }
    }
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Renders one frame.
    ///
    /// Order: clear, advance + upload vertex colors, begin scene, transforms,
    /// bind + draw, end scene, present. A failed clear or upload skips the scene;
    /// a failed scene begin skips drawing. The frame is presented in every case.
    pub fn render_frame(&mut self, time: &FrameTime) -> FrameReport {
        let mut report = FrameReport::default();

        let (Some(device), Some(buffer)) = (self.device.as_mut(), self.vertex_buffer.as_mut())
        else {
            report.failures.push(StepFailure {
                step: FrameStep::Clear,
                error: DeviceError::Released,
            });
            return report;
        };
        let warned = &mut self.warned;

        let cleared = report
            .record(warned, FrameStep::Clear, device.clear(self.config.clear_color))
            .is_some();

        self.store.advance_color();
        report.uploaded = report
            .record(warned, FrameStep::Upload, upload_vertices(buffer, self.store.vertices()))
            .is_some();

        if cleared && report.uploaded {
            let began = report
                .record(warned, FrameStep::BeginScene, device.begin_scene())
                .is_some();

            if began {
                let transforms = Transforms::at(time.time_ms, &self.config.camera);
                let transforms_set = report
                    .record(warned, FrameStep::SetTransforms, set_transforms(device, &transforms))
                    .is_some();

                if transforms_set {
                    report.drawn = report
                        .record(warned, FrameStep::Draw, draw_triangle(device, buffer))
                        .is_some();
                }

                report.record(warned, FrameStep::EndScene, device.end_scene());
            }
        }

        report.presented = report
            .record(warned, FrameStep::Present, device.present())
            .is_some();

        report
    }
}

fn set_transforms<D: GraphicsDevice>(
    device: &mut D,
    transforms: &Transforms,
) -> Result<(), DeviceError> {
    for state in TransformState::ALL {
        device.set_transform(state, transforms.get(state))?;
    }
    Ok(())
}

fn draw_triangle<D: GraphicsDevice>(
    device: &mut D,
    buffer: &D::VertexBuffer,
) -> Result<(), DeviceError> {
    device.set_stream_source(buffer, Vertex::STRIDE)?;
    device.set_vertex_format(buffer.format())?;
    device.draw_primitive(PrimitiveTopology::TriangleStrip, 0, 1)
}
