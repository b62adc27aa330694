//! Direct lighting: Lambert diffuse plus Phong specular, with hard shadows.
//!
//! The specular term only applies to materials with a positive power and a
//! non-black specular colour.

use crate::hittable::any_hit;
use crate::intersection::Intersection;
use lumen_core::Scene;
use lumen_math::{Color, Ray};

/// Shadow rays start this far along the normal from the surface.
pub const SHADOW_BIAS: f32 = 1e-3;

/// Light arriving directly from the scene's point lights at `hit`.
///
/// Lights behind the surface or blocked by any primitive contribute nothing.
pub fn apply_lighting(scene: &Scene, ray: &Ray, hit: &Intersection) -> Color {
    let material = hit.material;
    let origin = hit.point + hit.normal * SHADOW_BIAS;
    let mut output = Color::ZERO;

    for light in &scene.lights {
        let to_light = light.position - origin;
        let distance = to_light.length();
        if distance <= 0.0 {
            continue;
        }
        let l = to_light / distance;

        let lambert = hit.normal.dot(l);
        if lambert <= 0.0 {
            continue;
        }
        if any_hit(scene, &Ray::new(origin, l), distance) {
            continue;
        }

        let mut color = hit.diffuse * lambert;
        if material.power > 0.0 && material.specular != Color::ZERO {
            let reflected = -l - 2.0 * (-l).dot(hit.normal) * hit.normal;
            let phong = reflected.dot(-ray.direction()).max(0.0);
            color += material.specular * phong.powf(material.power);
        }
        output += light.intensity * color;
    }

    output
}
