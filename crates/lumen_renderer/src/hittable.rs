//! Hittable trait and nearest-hit search over the scene's primitives.

use lumen_core::Scene;
use lumen_math::{Interval, Ray, Vec3};

/// Hits closer than this to the ray origin are ignored.
///
/// Keeps secondary rays from re-hitting the surface they start on.
pub const HIT_EPSILON: f32 = 0.01;

/// Which surface of a cylinder was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CylinderPart {
    /// The curved lateral surface
    Side,
    /// The flat cap at `p1`
    StartCap,
    /// The flat cap at `p2`
    EndCap,
}

/// Identifies the primitive behind a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Sphere(usize),
    Plane(usize),
    Cylinder(usize, CylinderPart),
}

/// Record of the nearest ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Parameter t where the intersection occurs
    pub t: f32,
    pub primitive: Primitive,
}

/// Trait for primitives that can be hit by rays.
pub trait Hittable {
    /// Extra information a primitive needs to rebuild its normal.
    type Part: Copy;

    /// Nearest intersection strictly inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, Self::Part)>;

    /// Unit normal pointing out of the primitive at `point`.
    fn outward_normal(&self, point: Vec3, part: Self::Part) -> Vec3;

    fn material_id(&self) -> usize;
}

/// Scan one primitive list, shrinking `ray_t` as closer hits are found.
fn scan<H: Hittable>(
    objects: &[H],
    ray: &Ray,
    ray_t: &mut Interval,
    closest: &mut Option<Hit>,
    tag: impl Fn(usize, H::Part) -> Primitive,
) {
    for (index, object) in objects.iter().enumerate() {
        if let Some((t, part)) = object.hit(ray, *ray_t) {
            *ray_t = ray_t.with_max(t);
            *closest = Some(Hit {
                t,
                primitive: tag(index, part),
            });
        }
    }
}

/// Find the nearest hit in `(HIT_EPSILON, t_max)`.
///
/// Every primitive is tested; there is no acceleration structure.
pub fn nearest_hit(scene: &Scene, ray: &Ray, t_max: f32) -> Option<Hit> {
    let mut ray_t = Interval::new(HIT_EPSILON, t_max);
    let mut closest = None;

    scan(&scene.spheres, ray, &mut ray_t, &mut closest, |i, ()| {
        Primitive::Sphere(i)
    });
    scan(&scene.planes, ray, &mut ray_t, &mut closest, |i, ()| {
        Primitive::Plane(i)
    });
    scan(&scene.cylinders, ray, &mut ray_t, &mut closest, Primitive::Cylinder);

    closest
}

/// True if anything blocks the ray before `t_max`. Used for shadow rays.
pub fn any_hit(scene: &Scene, ray: &Ray, t_max: f32) -> bool {
    let ray_t = Interval::new(HIT_EPSILON, t_max);

    scene.spheres.iter().any(|s| s.hit(ray, ray_t).is_some())
        || scene.planes.iter().any(|p| p.hit(ray, ray_t).is_some())
        || scene.cylinders.iter().any(|c| c.hit(ray, ray_t).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Cylinder, Material, Plane, Sphere};

    fn scene() -> Scene {
        let mut scene = Scene::new("hits");
        let m = scene.add_material(Material::default());
        scene.spheres.push(Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0, m));
        scene.spheres.push(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, m));
        scene
            .planes
            .push(Plane::new(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z, m));
        scene.cylinders.push(Cylinder::new(
            Vec3::new(3.0, -1.0, 5.0),
            Vec3::new(3.0, 1.0, 5.0),
            0.5,
            m,
        ));
        scene
    }

    #[test]
    fn test_nearest_hit_picks_closest() {
        let scene = scene();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let hit = nearest_hit(&scene, &ray, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, Primitive::Sphere(1));
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_nearest_hit_respects_t_max() {
        let scene = scene();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        assert!(nearest_hit(&scene, &ray, 3.0).is_none());
    }

    #[test]
    fn test_nearest_hit_reaches_cylinder() {
        let scene = scene();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::X);

        // Starts inside sphere 1, whose far side is at t=1
        let hit = nearest_hit(&scene, &ray, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, Primitive::Sphere(1));

        let ray = Ray::new(Vec3::new(1.5, 0.0, 5.0), Vec3::X);
        let hit = nearest_hit(&scene, &ray, f32::INFINITY).unwrap();
        assert_eq!(hit.primitive, Primitive::Cylinder(0, CylinderPart::Side));
        assert!((hit.t - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_any_hit() {
        let scene = scene();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        assert!(any_hit(&scene, &ray, 100.0));
        assert!(!any_hit(&scene, &ray, 3.5));
        assert!(!any_hit(&scene, &Ray::new(Vec3::ZERO, Vec3::NEG_Z), 100.0));
    }

    #[test]
    fn test_hits_inside_epsilon_are_ignored() {
        let mut scene = Scene::new("epsilon");
        let m = scene.add_material(Material::default());
        scene.planes.push(Plane::new(Vec3::ZERO, Vec3::Z, m));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.005), Vec3::NEG_Z);
        assert!(nearest_hit(&scene, &ray, f32::INFINITY).is_none());
    }
}
