use bytemuck::{Pod, Zeroable};

/// Packed `0xAARRGGBB` color.
///
/// Stored little-endian, so the bytes in memory are `[b, g, r, a]`. Shaders read
/// it through a `Unorm8x4` attribute and swizzle back to RGBA.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const BLACK: Self = Self::xrgb(0, 0, 0);

    #[inline]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Opaque color (alpha forced to `0xFF`).
    #[inline]
    pub const fn xrgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xFF, r, g, b)
    }

    /// Returns `(a, r, g, b)`.
    #[inline]
    pub const fn channels(self) -> (u8, u8, u8, u8) {
        let [b, g, r, a] = self.0.to_le_bytes();
        (a, r, g, b)
    }

    /// Adds `step` to the packed value, wrapping at `2^32`.
    ///
    /// Carries propagate between channels: `0x000000FF + 1` yields `0x00000100`.
    #[inline]
    pub const fn wrapping_add(self, step: u32) -> Self {
        Self(self.0.wrapping_add(step))
    }

    /// Straight-alpha RGBA in `[0, 1]`.
    pub fn to_rgba_f32(self) -> [f32; 4] {
        let (a, r, g, b) = self.channels();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.to_rgba_f32();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}
