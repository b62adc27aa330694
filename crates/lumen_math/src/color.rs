//! Colour type and framebuffer pixel packing.

use crate::{Interval, Vec3};

/// Color type alias (linear RGB, unbounded while accumulating).
pub type Color = Vec3;

/// Exposure-map a colour and pack it into a framebuffer pixel.
///
/// Each channel is divided by `exposure`, saturated to [0, 1] and quantised
/// to 8 bits. The result is packed as `0xAARRGGBB` with an opaque alpha.
#[inline]
pub fn color_to_pixel(color: Color, exposure: f32) -> u32 {
    let mapped = color / exposure;
    let r = (255.0 * Interval::UNIT.clamp(mapped.x)) as u8 as u32;
    let g = (255.0 * Interval::UNIT.clamp(mapped.y)) as u8 as u32;
    let b = (255.0 * Interval::UNIT.clamp(mapped.z)) as u8 as u32;
    (0xFF << 24) | (r << 16) | (g << 8) | b
}

/// Unpack a framebuffer pixel into `[r, g, b]` bytes.
#[inline]
pub fn pixel_to_rgb(pixel: u32) -> [u8; 3] {
    [(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]
}
