//! Tile render devices.
//!
//! A [`TileDevice`] owns everything it needs to render one bucket of the
//! frame and returns that bucket's packed pixels. Calls are blocking: the
//! frame loop in [`render_tiled`](crate::render_tiled) submits a bucket,
//! waits for its pixels and copies them into the framebuffer.

mod buffers;
#[cfg(feature = "gpu")]
mod gpu;

pub use buffers::{
    GpuCylinder, GpuLight, GpuMaterial, GpuParams, GpuPlane, GpuSphere, SceneBuffers,
};
#[cfg(feature = "gpu")]
pub use gpu::GpuDevice;

use crate::bucket::{render_bucket, Bucket};
use crate::camera::CameraRig;
use crate::renderer::RenderConfig;
use lumen_core::Scene;
use thiserror::Error;

/// Errors raised while rendering on a device.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no suitable compute adapter found")]
    NoAdapter,

    #[error("failed to open compute device: {0}")]
    RequestDevice(String),

    #[error("compute shader rejected: {0}")]
    Shader(String),

    #[error("failed to read back tile: {0}")]
    Map(String),

    #[error("tile {index} at ({x}, {y}) size {width}x{height} falls outside the frame")]
    TileOutOfBounds {
        index: usize,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("device was set up for {device} but the frame asks for {frame}")]
    ConfigMismatch { device: String, frame: String },

    #[error("tile {index} returned {actual} pixels, expected {expected}")]
    TileSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Something that can render one bucket of a frame.
pub trait TileDevice {
    /// Human-readable device name for logs and output file names.
    fn name(&self) -> String;

    /// The settings the device renders with.
    fn config(&self) -> &RenderConfig;

    /// Render `bucket`, returning its pixels in row-major order.
    fn render_tile(&mut self, bucket: &Bucket) -> Result<Vec<u32>, DeviceError>;
}

/// Renders buckets on the CPU, one rayon task per pixel.
pub struct CpuDevice<'a> {
    scene: &'a Scene,
    config: RenderConfig,
    rig: CameraRig,
}

impl<'a> CpuDevice<'a> {
    pub fn new(scene: &'a Scene, config: RenderConfig) -> Self {
        let rig = CameraRig::new(&scene.camera, config.width, config.height, config.aa_level);
        Self { scene, config, rig }
    }
}

impl TileDevice for CpuDevice<'_> {
    fn name(&self) -> String {
        "cpu".to_string()
    }

    fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn render_tile(&mut self, bucket: &Bucket) -> Result<Vec<u32>, DeviceError> {
        if !bucket.fits(self.config.width, self.config.height) {
            return Err(DeviceError::TileOutOfBounds {
                index: bucket.index,
                x: bucket.x,
                y: bucket.y,
                width: bucket.width,
                height: bucket.height,
            });
        }
        Ok(render_bucket(bucket, self.scene, &self.rig, &self.config))
    }
}
