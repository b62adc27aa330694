//! Framebuffer to image file.

use std::path::Path;

use anyhow::{Context, Result};
use lumen_renderer::Framebuffer;

/// Write `framebuffer` as 8-bit RGB. The format follows the file extension.
pub fn write_image(path: &Path, framebuffer: &Framebuffer) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let image = image::RgbImage::from_raw(
        framebuffer.width,
        framebuffer.height,
        framebuffer.to_rgb8(),
    )
    .context("framebuffer size does not match its dimensions")?;

    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
