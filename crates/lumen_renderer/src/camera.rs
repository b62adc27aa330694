//! Primary ray generation.

use lumen_core::Camera;
use lumen_math::{Ray, Vec3};

/// Precomputed per-frame camera state for generating primary rays.
///
/// Pixel `(0, 0)` is the top-left corner of the image. Sub-samples sit at
/// the centres of an `aa_level x aa_level` grid inside each pixel, so with
/// one sample per pixel the ray goes through the pixel centre.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    origin: Vec3,
    dir_step: f32,
    cos_r: f32,
    sin_r: f32,
    half_width: f32,
    half_height: f32,
    aa_level: u32,
}

impl CameraRig {
    pub fn new(camera: &Camera, width: u32, height: u32, aa_level: u32) -> Self {
        let half_fov = (0.5 * camera.field_of_view).to_radians();
        let half_width = 0.5 * width as f32;

        Self {
            origin: camera.position,
            dir_step: 1.0 / (half_width / half_fov.tan()),
            cos_r: camera.rotation.cos(),
            sin_r: camera.rotation.sin(),
            half_width,
            half_height: 0.5 * height as f32,
            aa_level: aa_level.max(1),
        }
    }

    /// Distance between neighbouring pixels on the `z = 1` image plane.
    pub fn dir_step(&self) -> f32 {
        self.dir_step
    }

    pub fn aa_level(&self) -> u32 {
        self.aa_level
    }

    /// Ray through sub-sample `(sx, sy)` of pixel `(col, row)`.
    pub fn ray(&self, col: u32, row: u32, sx: u32, sy: u32) -> Ray {
        let aa = self.aa_level as f32;
        let fx = col as f32 - self.half_width + (sx as f32 + 0.5) / aa;
        let fy = self.half_height - row as f32 - (sy as f32 + 0.5) / aa;

        let d = Vec3::new(fx * self.dir_step, fy * self.dir_step, 1.0);
        let rotated = Vec3::new(
            d.x * self.cos_r - d.z * self.sin_r,
            d.y,
            d.x * self.sin_r + d.z * self.cos_r,
        );

        Ray::normalized(self.origin, rotated)
    }

    /// All sub-sample rays of a pixel, row by row.
    pub fn pixel_rays(&self, col: u32, row: u32) -> impl Iterator<Item = Ray> + '_ {
        let aa = self.aa_level;
        (0..aa).flat_map(move |sy| (0..aa).map(move |sx| self.ray(col, row, sx, sy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(rotation: f32) -> Camera {
        Camera {
            position: Vec3::new(0.0, 1.0, -10.0),
            rotation,
            field_of_view: 90.0,
        }
    }

    #[test]
    fn test_centre_ray_looks_forward() {
        // Odd size so that a pixel centre lands on the optical axis
        let rig = CameraRig::new(&camera(0.0), 101, 51, 1);
        let ray = rig.ray(50, 25, 0, 0);

        assert_eq!(ray.origin, Vec3::new(0.0, 1.0, -10.0));
        assert!((ray.direction - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_single_pixel_image() {
        let rig = CameraRig::new(&camera(0.0), 1, 1, 1);
        assert!((rig.ray(0, 0, 0, 0).direction - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_field_of_view_spans_image() {
        // 90 degrees: the left image edge is 45 degrees off axis
        let rig = CameraRig::new(&camera(0.0), 100, 100, 1);
        assert!((rig.dir_step() - 0.02).abs() < 1e-6);

        let left = rig.ray(0, 50, 0, 0).direction;
        assert!(left.x < 0.0);
        assert!((left.x / left.z + 0.99).abs() < 1e-4);
    }

    #[test]
    fn test_top_left_origin() {
        let rig = CameraRig::new(&camera(0.0), 64, 64, 1);
        let d = rig.ray(0, 0, 0, 0).direction;
        assert!(d.x < 0.0 && d.y > 0.0);
    }

    #[test]
    fn test_rotation_turns_view() {
        let rig = CameraRig::new(&camera(std::f32::consts::FRAC_PI_2), 1, 1, 1);
        let d = rig.ray(0, 0, 0, 0).direction;
        assert!((d - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_pixel_rays_cover_subsamples() {
        let rig = CameraRig::new(&camera(0.0), 8, 8, 3);
        let rays: Vec<Ray> = rig.pixel_rays(4, 4).collect();

        assert_eq!(rays.len(), 9);
        assert_eq!(rays[0], rig.ray(4, 4, 0, 0));
        assert_eq!(rays[1], rig.ray(4, 4, 1, 0));
        assert_eq!(rays[8], rig.ray(4, 4, 2, 2));
    }
}
