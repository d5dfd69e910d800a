use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::device::{allocate_and_fill, GraphicsDevice, RenderStates};
use crate::geometry::VertexStore;

use super::{FrameStep, SceneConfig};

/// Everything the frame renderer needs: the device, the triangle's vertex
/// buffer and the CPU vertex store it mirrors.
///
/// Resources are released exactly once, buffer before device, either by
/// [`shutdown`](Self::shutdown) or on drop.
pub struct RenderContext<D: GraphicsDevice> {
    pub(super) vertex_buffer: Option<D::VertexBuffer>,
    pub(super) device: Option<D>,
    pub(super) store: VertexStore,
    pub(super) config: SceneConfig,

    /// Steps whose failure was already reported at warn level.
    pub(super) warned: HashSet<FrameStep>,
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Configures `device` for unlit two-sided drawing and uploads the triangle.
    ///
    /// On failure the device is released before the error is returned.
    pub fn initialize(mut device: D, config: SceneConfig) -> Result<Self> {
        device.set_render_states(RenderStates::unlit_two_sided());

        let store = VertexStore::new(config.vertices, config.color_step);
        let vertex_buffer = allocate_and_fill(&mut device, store.vertices())
            .context("failed to create the triangle vertex buffer")?;

        log::info!("render context initialized");

        Ok(Self {
            vertex_buffer: Some(vertex_buffer),
            device: Some(device),
            store,
            config,
            warned: HashSet::new(),
        })
    }

    #[inline]
    pub fn store(&self) -> &VertexStore {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Option<&mut D> {
        self.device.as_mut()
    }

    pub fn vertex_buffer(&self) -> Option<&D::VertexBuffer> {
        self.vertex_buffer.as_ref()
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }

    /// Releases the vertex buffer, then the device. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if let Some(buffer) = self.vertex_buffer.take() {
            match self.device.as_mut() {
                Some(device) => device.release_vertex_buffer(buffer),
                None => drop(buffer),
            }
            log::debug!("vertex buffer released");
        }
        if let Some(device) = self.device.take() {
            drop(device);
            log::info!("graphics device released");
        }
    }
}

impl<D: GraphicsDevice> Drop for RenderContext<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
