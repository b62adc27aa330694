//! Procedural diffuse patterns.
//!
//! All patterns work in pattern space, `(point - offset) / size`, and pick
//! between `diffuse` and `diffuse2`. A non-positive size counts as 1.

use lumen_core::{Material, MaterialKind};
use lumen_math::{Color, Vec3};

#[inline]
fn parity(x: f32) -> u32 {
    (x.floor() as i64 & 1) as u32
}

fn pick(material: &Material, which: u32) -> Color {
    if which == 0 {
        material.diffuse
    } else {
        material.diffuse2
    }
}

/// Diffuse colour of `material` at `point`.
///
/// `normal` selects the checkerboard projection plane; its sign is ignored.
pub fn diffuse_at(material: &Material, point: Vec3, normal: Vec3) -> Color {
    if material.kind == MaterialKind::Gouraud {
        return material.diffuse;
    }

    let size = if material.size > 0.0 { material.size } else { 1.0 };
    let p = (point - material.offset) / size;

    match material.kind {
        MaterialKind::Checkerboard => {
            // Project onto the two axes orthogonal to the dominant normal axis
            let n = normal.abs();
            let (u, v) = if n.x >= n.y && n.x >= n.z {
                (p.y, p.z)
            } else if n.y >= n.z {
                (p.x, p.z)
            } else {
                (p.x, p.y)
            };
            pick(material, parity(u) ^ parity(v))
        }
        MaterialKind::Wood => {
            let r = (p.x * p.x + p.z * p.z).sqrt();
            let s = 0.5 - 0.5 * (std::f32::consts::TAU * (r - r.floor())).cos();
            material.diffuse.lerp(material.diffuse2, s)
        }
        MaterialKind::Circles => {
            let r = (p.x * p.x + p.z * p.z).sqrt();
            pick(material, parity(r))
        }
        MaterialKind::Gouraud => material.diffuse,
    }
}
