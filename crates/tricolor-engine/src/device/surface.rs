use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;

    let srgb = caps.formats.iter().copied().find(|f| f.is_srgb());
    let linear = caps.formats.iter().copied().find(|f| !f.is_srgb());

    let picked = if prefer_srgb { srgb.or(linear) } else { linear.or(srgb) };
    Some(picked.unwrap_or(first))
}

/// The requested alpha mode when the surface offers it, else the surface's first.
pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    match requested {
        Some(mode) if caps.alpha_modes.contains(&mode) => mode,
        _ => caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
    }
}

/// wgpu cannot configure a 0x0 surface (minimized window); configuration is
/// deferred until a non-zero size arrives.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
    log::debug!("surface reconfigured to {}x{}", new_size.width, new_size.height);
}

/// Lost or outdated surfaces are reconfigured on the spot unless minimized.
pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    use wgpu::SurfaceError as E;

    let action = match err {
        E::Lost | E::Outdated => SurfaceErrorAction::Reconfigured,
        E::Timeout | E::Other => SurfaceErrorAction::SkipFrame,
        E::OutOfMemory => SurfaceErrorAction::Fatal,
    };

    let visible = size.width > 0 && size.height > 0;
    if action == SurfaceErrorAction::Reconfigured && visible {
        surface.configure(device, config);
    }

    log::debug!("surface error {err:?} -> {action:?}");
    action
}
