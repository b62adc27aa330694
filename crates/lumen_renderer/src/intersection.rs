//! Surface response at a hit: point, facing normal and material.

use crate::hittable::{Hit, Hittable, Primitive};
use crate::procedural::diffuse_at;
use lumen_core::{Material, Scene};
use lumen_math::{Color, Ray, Vec3};

/// Everything the walker needs to know about a hit.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    /// Point of intersection
    pub point: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Unit normal, always facing against the incoming ray
    pub normal: Vec3,
    /// `direction . normal`, taken after the normal is flipped
    pub view_projection: f32,
    /// Whether the ray was travelling inside the object
    pub inside_object: bool,
    /// Material at the intersection point
    pub material: &'a Material,
    /// Diffuse colour after procedural patterns are applied
    pub diffuse: Color,
    pub primitive: Primitive,
}

impl<'a> Intersection<'a> {
    /// Build the response for `hit` along `ray`.
    pub fn respond(scene: &'a Scene, ray: &Ray, hit: Hit) -> Self {
        let point = ray.at(hit.t);
        let (outward, material_id) = match hit.primitive {
            Primitive::Sphere(i) => {
                let sphere = &scene.spheres[i];
                (sphere.outward_normal(point, ()), sphere.material_id())
            }
            Primitive::Plane(i) => {
                let plane = &scene.planes[i];
                (plane.outward_normal(point, ()), plane.material_id())
            }
            Primitive::Cylinder(i, part) => {
                let cylinder = &scene.cylinders[i];
                (cylinder.outward_normal(point, part), cylinder.material_id())
            }
        };

        let material = scene.material(material_id);
        let mut rec = Self {
            point,
            t: hit.t,
            normal: outward,
            view_projection: 0.0,
            inside_object: false,
            material,
            diffuse: diffuse_at(material, point, outward),
            primitive: hit.primitive,
        };
        rec.set_face_normal(ray, outward);
        rec
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// A ray travelling along the outward normal is inside the object.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        let projection = ray.direction().dot(outward_normal);
        self.inside_object = projection > 0.0;

        if self.inside_object {
            self.normal = -outward_normal;
            self.view_projection = -projection;
        } else {
            self.normal = outward_normal;
            self.view_projection = projection;
        }
    }
}
