//! Frame rendering.
//!
//! Implements the two ways of producing a frame:
//! - `render`: every row in parallel on the CPU with rayon
//! - `render_tiled`: bucket by bucket through a [`TileDevice`]
//!
//! Both produce identical pixels for the same scene and configuration.

use crate::bucket::{generate_buckets, Bucket, DEFAULT_BUCKET_SIZE};
use crate::camera::CameraRig;
use crate::device::{DeviceError, TileDevice};
use crate::tracer::{trace_ray, MAX_RAYS_CAST};
use lumen_core::Scene;
use lumen_math::{color_to_pixel, pixel_to_rgb, Color};
use rayon::prelude::*;
use std::time::Instant;

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Samples per pixel along each axis; `aa_level^2` rays per pixel
    pub aa_level: u32,
    /// Maximum surface interactions per camera ray
    pub max_rays_cast: u32,
    /// Bucket edge length used by `render_tiled`
    pub tile_size: u32,
    /// Write a coordinate gradient instead of tracing
    pub test_mode: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            aa_level: 1,
            max_rays_cast: MAX_RAYS_CAST,
            tile_size: DEFAULT_BUCKET_SIZE,
            test_mode: false,
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the anti-aliasing level. Zero is treated as one.
    pub fn with_aa_level(mut self, aa_level: u32) -> Self {
        self.aa_level = aa_level.max(1);
        self
    }

    pub fn with_max_rays_cast(mut self, max_rays_cast: u32) -> Self {
        self.max_rays_cast = max_rays_cast;
        self
    }

    /// Set the bucket size. Zero is treated as one.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Rays traced per pixel.
    pub fn samples_per_pixel(&self) -> u32 {
        let aa = self.aa_level.max(1);
        aa * aa
    }

    /// Rays traced for the whole frame.
    pub fn total_samples(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.samples_per_pixel() as u64
    }
}

/// Packed `0xAARRGGBB` pixels, row-major with the origin at the top left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with zeros.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.offset(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) {
        let offset = self.offset(x, y);
        self.pixels[offset] = pixel;
    }

    /// Copy a bucket's row-major pixels into place.
    pub fn write_bucket(&mut self, bucket: &Bucket, pixels: &[u32]) -> Result<(), DeviceError> {
        if !bucket.fits(self.width, self.height) {
            return Err(DeviceError::TileOutOfBounds {
                index: bucket.index,
                x: bucket.x,
                y: bucket.y,
                width: bucket.width,
                height: bucket.height,
            });
        }
        if pixels.len() != bucket.pixel_count() as usize {
            return Err(DeviceError::TileSize {
                index: bucket.index,
                expected: bucket.pixel_count() as usize,
                actual: pixels.len(),
            });
        }

        let row_len = bucket.width as usize;
        for (local_y, src) in pixels.chunks_exact(row_len.max(1)).enumerate() {
            let start = self.offset(bucket.x, bucket.y + local_y as u32);
            self.pixels[start..start + row_len].copy_from_slice(src);
        }
        Ok(())
    }

    /// Convert to RGB bytes (for saving).
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|&p| pixel_to_rgb(p)).collect()
    }
}

/// Output of a frame render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub framebuffer: Framebuffer,
    /// Camera rays the frame accounts for, `width * height * aa_level^2`
    pub samples_rendered: u64,
}

/// Pixel written in test mode: red follows the column, blue the row.
#[inline]
pub fn test_pattern_pixel(col: u32, row: u32) -> u32 {
    0xFF00_0000 | (col % 256) << 16 | (row % 256)
}

/// Render a single pixel, averaging its `aa_level^2` sub-samples.
pub fn render_pixel(
    scene: &Scene,
    rig: &CameraRig,
    config: &RenderConfig,
    col: u32,
    row: u32,
) -> u32 {
    if config.test_mode {
        return test_pattern_pixel(col, row);
    }

    let weight = 1.0 / config.samples_per_pixel() as f32;
    let mut pixel_color = Color::ZERO;
    for ray in rig.pixel_rays(col, row) {
        pixel_color += weight * trace_ray(scene, &ray, config.max_rays_cast);
    }

    color_to_pixel(pixel_color, scene.exposure)
}

/// Render the whole frame on the CPU, one rayon task per row.
pub fn render(scene: &Scene, config: &RenderConfig) -> RenderOutput {
    let mut framebuffer = Framebuffer::new(config.width, config.height);
    let start = Instant::now();

    if config.width > 0 && config.height > 0 {
        let rig = CameraRig::new(&scene.camera, config.width, config.height, config.aa_level);
        let width = config.width as usize;

        framebuffer
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, line)| {
                for (col, pixel) in line.iter_mut().enumerate() {
                    *pixel = render_pixel(scene, &rig, config, col as u32, row as u32);
                }
            });
    }

    log::debug!(
        "Rendered {}x{} in {:.2?}",
        config.width,
        config.height,
        start.elapsed()
    );

    RenderOutput {
        framebuffer,
        samples_rendered: config.total_samples(),
    }
}

/// Render the frame bucket by bucket on `device`.
///
/// `config` must be the configuration the device was created with. Each
/// bucket is a blocking call; the first device error aborts the frame.
pub fn render_tiled(
    config: &RenderConfig,
    device: &mut dyn TileDevice,
) -> Result<RenderOutput, DeviceError> {
    if device.config() != config {
        return Err(DeviceError::ConfigMismatch {
            device: format!("{:?}", device.config()),
            frame: format!("{:?}", config),
        });
    }

    let mut framebuffer = Framebuffer::new(config.width, config.height);
    let buckets = generate_buckets(config.width, config.height, config.tile_size);
    let start = Instant::now();

    log::debug!(
        "Rendering {} buckets of {}px on {}",
        buckets.len(),
        config.tile_size,
        device.name()
    );

    for bucket in &buckets {
        let pixels = device.render_tile(bucket)?;
        framebuffer.write_bucket(bucket, &pixels)?;
        log::trace!(
            "Bucket {}/{} at ({}, {}) done",
            bucket.index + 1,
            buckets.len(),
            bucket.x,
            bucket.y
        );
    }

    log::debug!(
        "Rendered {}x{} in {:.2?}",
        config.width,
        config.height,
        start.elapsed()
    );

    Ok(RenderOutput {
        framebuffer,
        samples_rendered: config.total_samples(),
    })
}
