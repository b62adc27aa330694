//! Sphere intersection.

use crate::hittable::Hittable;
use lumen_core::Sphere;
use lumen_math::{Interval, Ray, Vec3};

impl Hittable for Sphere {
    type Part = ();

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, ())> {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        Some((root, ()))
    }

    fn outward_normal(&self, point: Vec3, _part: ()) -> Vec3 {
        (point - self.center).normalize_or_zero()
    }

    fn material_id(&self) -> usize {
        self.material_id
    }
}
