// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod color;
mod interval;
mod ray;

pub use color::{color_to_pixel, pixel_to_rgb, Color};
pub use interval::Interval;
pub use ray::Ray;
