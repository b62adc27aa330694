//! Lumen Renderer - Whitted-style ray tracing.
//!
//! Turns a [`Scene`](lumen_core::Scene) into a packed-pixel framebuffer:
//! - Brute-force nearest-hit search over spheres, planes and capped cylinders
//! - Direct diffuse + Phong lighting with hard shadows
//! - Procedural checkerboard, wood and circle materials
//! - Iterative mirror reflection and Snell refraction
//! - Stratified anti-aliasing, tiled (bucket) dispatch to CPU or GPU devices

mod bucket;
mod camera;
mod cylinder;
mod hittable;
mod intersection;
mod lighting;
mod plane;
mod procedural;
mod renderer;
mod sphere;
mod tracer;

pub mod device;

pub use bucket::{generate_buckets, render_bucket, Bucket, DEFAULT_BUCKET_SIZE};
pub use camera::CameraRig;
pub use hittable::{any_hit, nearest_hit, CylinderPart, Hit, Hittable, Primitive, HIT_EPSILON};
pub use intersection::Intersection;
pub use lighting::{apply_lighting, SHADOW_BIAS};
pub use procedural::diffuse_at;
pub use renderer::{
    render, render_pixel, render_tiled, test_pattern_pixel, Framebuffer, RenderConfig,
    RenderOutput,
};
pub use tracer::{
    interact, reflect, refract, trace_ray, trace_ray_with_stats, Interaction, Step, TraceResult,
    MAX_RAYS_CAST,
};

/// Re-export common math types from lumen_math
pub use lumen_math::{Color, Interval, Ray, Vec3};
