use crate::geometry::PackedColor;

/// Where vertices are transformed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum VertexProcessing {
    /// World/view/projection applied on the CPU before upload.
    #[default]
    Software,
    /// World/view/projection applied in the vertex shader.
    Hardware,
}

/// How [`WgpuDevice`](super::WgpuDevice) sets up the adapter and swapchain.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when the surface has one.
    ///
    /// Packed vertex colors are display-referred, so the default is a linear
    /// (non-sRGB) surface that writes them unchanged.
    pub prefer_srgb: bool,

    /// FIFO waits for vblank, which is the only frame pacing the loop has.
    pub present_mode: wgpu::PresentMode,

    /// Requested compositing alpha; ignored when the surface lacks it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// 2 keeps one frame in flight while the next is recorded (double buffering).
    pub desired_maximum_frame_latency: u32,

    pub vertex_processing: VertexProcessing,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            vertex_processing: VertexProcessing::default(),
        }
    }
}

/// Triangle face culling.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    /// Cull clockwise faces.
    Cw,
    /// Cull counter-clockwise faces (the fixed-function default).
    #[default]
    Ccw,
}

impl CullMode {
    /// wgpu face to cull, given front faces are clockwise (left-handed convention).
    pub fn to_wgpu(self) -> Option<wgpu::Face> {
        match self {
            Self::None => None,
            Self::Cw => Some(wgpu::Face::Front),
            Self::Ccw => Some(wgpu::Face::Back),
        }
    }
}

/// Fixed-function render state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RenderStates {
    pub cull: CullMode,

    /// With lighting on and no lights defined, vertices take the ambient color.
    pub lighting: bool,
    pub ambient: PackedColor,
}

impl Default for RenderStates {
    fn default() -> Self {
        Self {
            cull: CullMode::Ccw,
            lighting: true,
            ambient: PackedColor(0),
        }
    }
}

impl RenderStates {
    /// Both faces visible, vertex colors used directly.
    pub fn unlit_two_sided() -> Self {
        Self {
            cull: CullMode::None,
            lighting: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_function_device() {
        let s = RenderStates::default();
        assert_eq!(s.cull, CullMode::Ccw);
        assert!(s.lighting);
    }

    #[test]
    fn unlit_two_sided_disables_cull_and_lighting() {
        let s = RenderStates::unlit_two_sided();
        assert_eq!(s.cull.to_wgpu(), None);
        assert!(!s.lighting);
    }

    #[test]
    fn gpu_init_defaults_to_software_double_buffered() {
        let init = GpuInit::default();
        assert_eq!(init.vertex_processing, VertexProcessing::Software);
        assert_eq!(init.desired_maximum_frame_latency, 2);
        assert_eq!(init.present_mode, wgpu::PresentMode::Fifo);
    }
}
