//! Infinite plane intersection.

use crate::hittable::Hittable;
use lumen_core::Plane;
use lumen_math::{Interval, Ray, Vec3};

/// Rays closer than this to parallel never hit a plane.
pub(crate) const PARALLEL_EPSILON: f32 = 1e-6;

impl Hittable for Plane {
    type Part = ();

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, ())> {
        let denom = ray.direction().dot(self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.point - ray.origin()).dot(self.normal) / denom;
        ray_t.surrounds(t).then_some((t, ()))
    }

    fn outward_normal(&self, _point: Vec3, _part: ()) -> Vec3 {
        self.normal
    }

    fn material_id(&self) -> usize {
        self.material_id
    }
}
