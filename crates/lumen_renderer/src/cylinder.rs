//! Capped cylinder intersection.
//!
//! The lateral surface is solved as a quadratic in the plane orthogonal to
//! the axis and rejected outside `[0, height]` along it. Both caps are then
//! tested as discs; the nearest of the three wins.

use crate::hittable::{CylinderPart, Hittable};
use crate::plane::PARALLEL_EPSILON;
use lumen_core::Cylinder;
use lumen_math::{Interval, Ray, Vec3};

fn hit_side(cyl: &Cylinder, ray: &Ray, ray_t: Interval, axis: Vec3, height: f32) -> Option<f32> {
    let oc = ray.origin() - cyl.p1;
    let d_perp = ray.direction() - axis * ray.direction().dot(axis);
    let o_perp = oc - axis * oc.dot(axis);

    let a = d_perp.length_squared();
    if a <= 1e-12 {
        // Travelling along the axis: only the caps can be hit
        return None;
    }
    let h = d_perp.dot(o_perp);
    let c = o_perp.length_squared() - cyl.radius * cyl.radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    [(-h - sqrtd) / a, (-h + sqrtd) / a]
        .into_iter()
        .find(|&t| {
            let along = (oc + ray.direction() * t).dot(axis);
            ray_t.surrounds(t) && (0.0..=height).contains(&along)
        })
}

fn hit_cap(cyl: &Cylinder, ray: &Ray, ray_t: Interval, center: Vec3, axis: Vec3) -> Option<f32> {
    let denom = ray.direction().dot(axis);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (center - ray.origin()).dot(axis) / denom;
    let on_disc = (ray.at(t) - center).length_squared() <= cyl.radius * cyl.radius;
    (ray_t.surrounds(t) && on_disc).then_some(t)
}

impl Hittable for Cylinder {
    type Part = CylinderPart;

    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, CylinderPart)> {
        let height = self.height();
        if height <= 0.0 {
            return None;
        }
        let axis = self.axis();

        let mut ray_t = ray_t;
        let mut closest = None;

        if let Some(t) = hit_side(self, ray, ray_t, axis, height) {
            ray_t = ray_t.with_max(t);
            closest = Some((t, CylinderPart::Side));
        }
        if let Some(t) = hit_cap(self, ray, ray_t, self.p1, axis) {
            ray_t = ray_t.with_max(t);
            closest = Some((t, CylinderPart::StartCap));
        }
        if let Some(t) = hit_cap(self, ray, ray_t, self.p2, axis) {
            closest = Some((t, CylinderPart::EndCap));
        }

        closest
    }

    fn outward_normal(&self, point: Vec3, part: CylinderPart) -> Vec3 {
        let axis = self.axis();
        match part {
            CylinderPart::Side => {
                let v = point - self.p1;
                (v - axis * v.dot(axis)).normalize_or_zero()
            }
            CylinderPart::StartCap => -axis,
            CylinderPart::EndCap => axis,
        }
    }

    fn material_id(&self) -> usize {
        self.material_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upright() -> Cylinder {
        // Axis along +Y from y=0 to y=2, radius 1, centred on the origin
        Cylinder::new(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), 1.0, 0)
    }

    fn interval() -> Interval {
        Interval::new(0.01, f32::INFINITY)
    }

    #[test]
    fn test_cylinder_side_hit() {
        let ray = Ray::new(Vec3::new(-5.0, 1.0, 0.0), Vec3::X);

        let (t, part) = upright().hit(&ray, interval()).unwrap();
        assert_eq!(part, CylinderPart::Side);
        assert!((t - 4.0).abs() < 1e-4);

        let n = upright().outward_normal(ray.at(t), part);
        assert!((n - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_cylinder_side_outside_segment_misses() {
        let ray = Ray::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::X);
        assert!(upright().hit(&ray, interval()).is_none());
    }

    #[test]
    fn test_cylinder_caps() {
        let down = Ray::new(Vec3::new(0.2, 5.0, 0.1), Vec3::NEG_Y);
        let (t, part) = upright().hit(&down, interval()).unwrap();
        assert_eq!(part, CylinderPart::EndCap);
        assert!((t - 3.0).abs() < 1e-4);
        assert_eq!(upright().outward_normal(down.at(t), part), Vec3::Y);

        let up = Ray::new(Vec3::new(0.0, -4.0, 0.0), Vec3::Y);
        let (t, part) = upright().hit(&up, interval()).unwrap();
        assert_eq!(part, CylinderPart::StartCap);
        assert!((t - 4.0).abs() < 1e-4);
        assert_eq!(upright().outward_normal(up.at(t), part), Vec3::NEG_Y);
    }

    #[test]
    fn test_cylinder_cap_outside_radius_misses() {
        let ray = Ray::new(Vec3::new(1.5, 5.0, 0.0), Vec3::NEG_Y);
        assert!(upright().hit(&ray, interval()).is_none());
    }

    #[test]
    fn test_cylinder_diagonal_ray_enters_through_cap() {
        // Enters the top cap at (0.5, 2, 0) before reaching the side
        let origin = Vec3::new(-0.5, 4.0, 0.0);
        let ray = Ray::normalized(origin, Vec3::new(0.5, -1.0, 0.0));

        let (t, part) = upright().hit(&ray, interval()).unwrap();
        assert_eq!(part, CylinderPart::EndCap);
        assert!((ray.at(t).y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_cylinder_is_never_hit() {
        let flat = Cylinder::new(Vec3::ZERO, Vec3::ZERO, 1.0, 0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(flat.hit(&ray, interval()).is_none());
    }
}
