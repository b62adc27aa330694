//! Iterative Whitted-style ray walker.
//!
//! A ray is followed through at most `max_rays_cast` surface interactions.
//! Each step adds the direct lighting at the hit, scaled by the running
//! coefficient, then either continues along a reflected or refracted ray or
//! stops at an opaque surface. Whatever coefficient is left when the ray
//! leaves the scene, or runs out of steps, picks up the skybox colour.

use crate::hittable::nearest_hit;
use crate::intersection::Intersection;
use crate::lighting::apply_lighting;
use lumen_core::{Scene, DEFAULT_REFRACTIVE_INDEX};
use lumen_math::{Color, Ray, Vec3};

/// Default number of surface interactions followed per camera ray.
pub const MAX_RAYS_CAST: u32 = 10;

/// How a ray continues after one surface interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Continue along the mirrored ray, scaling the coefficient by `coef`
    Reflect { ray: Ray, coef: f32 },
    /// Continue along the transmitted ray, scaling the coefficient by `coef`
    Refract { ray: Ray, coef: f32 },
    /// Absorbed; the accumulated colour is final
    Opaque,
    /// Nothing was hit
    Miss,
}

/// Result of one interaction: the direct light found there and what comes next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub direct: Color,
    pub interaction: Interaction,
}

/// Colour of a traced ray plus the bookkeeping tests and logs care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    pub color: Color,
    /// Coefficient left when the walk ended
    pub coef: f32,
    /// Reflections and refractions followed
    pub bounces: u32,
    /// Whether the skybox colour was added
    pub reached_sky: bool,
}

/// Mirror `direction` about `normal`, given `view_projection = direction . normal`.
#[inline]
pub fn reflect(direction: Vec3, normal: Vec3, view_projection: f32) -> Vec3 {
    direction - normal * (2.0 * view_projection)
}

/// Bend `direction` through a surface using Snell's law.
///
/// `normal` faces the incoming ray and `ratio` is the old refractive index
/// over the new one. Total internal reflection clamps the transmitted cosine
/// to zero instead of reflecting.
pub fn refract(direction: Vec3, normal: Vec3, view_projection: f32, ratio: f32) -> Vec3 {
    let cos_i = view_projection.abs();
    let cos_t = if cos_i >= 1.0 {
        1.0
    } else {
        let sin_t = ratio * (1.0 - cos_i * cos_i).sqrt();
        if sin_t * sin_t >= 1.0 {
            0.0
        } else {
            (1.0 - sin_t * sin_t).sqrt()
        }
    };

    ((direction + normal * cos_i) * ratio - normal * cos_t).normalize()
}

/// Follow `ray` through one surface interaction.
///
/// `refractive_index` is the index of the medium the ray is travelling in
/// and is updated when the ray refracts.
pub fn interact(scene: &Scene, ray: &Ray, refractive_index: &mut f32) -> Step {
    let Some(hit) = nearest_hit(scene, ray, f32::INFINITY) else {
        return Step {
            direct: Color::ZERO,
            interaction: Interaction::Miss,
        };
    };

    let rec = Intersection::respond(scene, ray, hit);
    let material = rec.material;

    // Surfaces are only lit from outside
    let direct = if rec.inside_object {
        Color::ZERO
    } else {
        apply_lighting(scene, ray, &rec)
    };

    let interaction = if material.reflection != 0.0 {
        let direction = reflect(ray.direction(), rec.normal, rec.view_projection);
        Interaction::Reflect {
            ray: Ray::normalized(rec.point, direction),
            coef: material.reflection,
        }
    } else if material.refraction != 0.0 {
        let old_index = *refractive_index;
        *refractive_index = if rec.inside_object || material.density <= 0.0 {
            DEFAULT_REFRACTIVE_INDEX
        } else {
            material.density
        };
        let ratio = old_index / *refractive_index;

        Interaction::Refract {
            ray: Ray::new(
                rec.point,
                refract(ray.direction(), rec.normal, rec.view_projection, ratio),
            ),
            coef: material.refraction,
        }
    } else {
        Interaction::Opaque
    };

    Step {
        direct,
        interaction,
    }
}

/// Trace a camera ray and report how the walk ended.
pub fn trace_ray_with_stats(scene: &Scene, ray: &Ray, max_rays_cast: u32) -> TraceResult {
    let mut ray = *ray;
    let mut color = Color::ZERO;
    let mut coef: f32 = 1.0;
    let mut refractive_index = DEFAULT_REFRACTIVE_INDEX;
    let mut bounces = 0;

    for _ in 0..max_rays_cast {
        let step = interact(scene, &ray, &mut refractive_index);
        color += coef * step.direct;

        match step.interaction {
            Interaction::Reflect { ray: next, coef: k }
            | Interaction::Refract { ray: next, coef: k } => {
                ray = next;
                coef *= k;
                bounces += 1;
            }
            Interaction::Opaque => {
                return TraceResult {
                    color,
                    coef,
                    bounces,
                    reached_sky: false,
                };
            }
            Interaction::Miss => break,
        }
    }

    let reached_sky = coef > 0.0;
    if reached_sky {
        color += coef * scene.skybox().diffuse;
    }

    TraceResult {
        color,
        coef,
        bounces,
        reached_sky,
    }
}

/// Trace a camera ray and return its unclamped colour.
#[inline]
pub fn trace_ray(scene: &Scene, ray: &Ray, max_rays_cast: u32) -> Color {
    trace_ray_with_stats(scene, ray, max_rays_cast).color
}
