//! Flat, device-ready copies of a scene.
//!
//! Every struct here is `#[repr(C)]` plain old data laid out to match the
//! std430/uniform rules of the compute shader: vectors are widened to four
//! floats and spare lanes carry scalars. Empty collections are padded with
//! one zeroed element because zero-sized storage bindings are not allowed;
//! the real counts travel in [`GpuParams`].

use crate::bucket::Bucket;
use crate::renderer::RenderConfig;
use bytemuck::{Pod, Zeroable};
use lumen_core::{Camera, Cylinder, Light, Material, MaterialKind, Plane, Scene, Sphere};
use lumen_math::Vec3;

#[inline]
fn widen(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

#[inline]
fn narrow(v: [f32; 4]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

/// Material record. Spare lanes: `diffuse.w` = size, `diffuse2.w` = power,
/// `specular.w` = reflection, `offset.w` = refraction.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub diffuse: [f32; 4],
    pub diffuse2: [f32; 4],
    pub specular: [f32; 4],
    pub offset: [f32; 4],
    pub density: f32,
    pub kind: u32,
    pub _pad: [u32; 2],
}

impl From<&Material> for GpuMaterial {
    fn from(m: &Material) -> Self {
        Self {
            diffuse: widen(m.diffuse, m.size),
            diffuse2: widen(m.diffuse2, m.power),
            specular: widen(m.specular, m.reflection),
            offset: widen(m.offset, m.refraction),
            density: m.density,
            kind: m.kind.tag(),
            _pad: [0; 2],
        }
    }
}

impl From<&GpuMaterial> for Material {
    fn from(m: &GpuMaterial) -> Self {
        Self {
            kind: MaterialKind::from_tag(m.kind),
            size: m.diffuse[3],
            offset: narrow(m.offset),
            diffuse: narrow(m.diffuse),
            diffuse2: narrow(m.diffuse2),
            specular: narrow(m.specular),
            power: m.diffuse2[3],
            reflection: m.specular[3],
            refraction: m.offset[3],
            density: m.density,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 4],
    pub intensity: [f32; 4],
}

impl From<&Light> for GpuLight {
    fn from(l: &Light) -> Self {
        Self {
            position: widen(l.position, 1.0),
            intensity: widen(l.intensity, 0.0),
        }
    }
}

/// Sphere record; `center.w` is the radius.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 4],
    pub material: u32,
    pub _pad: [u32; 3],
}

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        Self {
            center: widen(s.center, s.radius),
            material: s.material_id as u32,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPlane {
    pub point: [f32; 4],
    pub normal: [f32; 4],
    pub material: u32,
    pub _pad: [u32; 3],
}

impl From<&Plane> for GpuPlane {
    fn from(p: &Plane) -> Self {
        Self {
            point: widen(p.point, 1.0),
            normal: widen(p.normal, 0.0),
            material: p.material_id as u32,
            _pad: [0; 3],
        }
    }
}

/// Cylinder record; `p1.w` is the radius.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuCylinder {
    pub p1: [f32; 4],
    pub p2: [f32; 4],
    pub material: u32,
    pub _pad: [u32; 3],
}

impl From<&Cylinder> for GpuCylinder {
    fn from(c: &Cylinder) -> Self {
        Self {
            p1: widen(c.p1, c.radius),
            p2: widen(c.p2, 1.0),
            material: c.material_id as u32,
            _pad: [0; 3],
        }
    }
}

/// Uniform block for one tile dispatch.
///
/// `camera.w` is the yaw in radians.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuParams {
    pub camera: [f32; 4],
    pub exposure: f32,
    pub field_of_view: f32,
    pub skybox_material: u32,
    pub max_rays_cast: u32,

    pub width: u32,
    pub height: u32,
    pub aa_level: u32,
    pub test_mode: u32,

    pub tile_size: u32,
    pub tile_index: u32,
    pub tile_x: u32,
    pub tile_y: u32,

    pub tile_width: u32,
    pub tile_height: u32,
    pub num_lights: u32,
    pub num_materials: u32,

    pub num_spheres: u32,
    pub num_planes: u32,
    pub num_cylinders: u32,
    pub _pad: u32,
}

impl GpuParams {
    /// Copy with the frame settings and `bucket` filled in.
    pub fn for_tile(&self, config: &RenderConfig, bucket: &Bucket) -> Self {
        Self {
            max_rays_cast: config.max_rays_cast,
            width: config.width,
            height: config.height,
            aa_level: config.aa_level.max(1),
            test_mode: config.test_mode as u32,
            tile_size: config.tile_size,
            tile_index: bucket.index as u32,
            tile_x: bucket.x,
            tile_y: bucket.y,
            tile_width: bucket.width,
            tile_height: bucket.height,
            ..*self
        }
    }
}

fn flatten<T, G: Zeroable>(items: &[T], convert: impl Fn(&T) -> G) -> Vec<G> {
    if items.is_empty() {
        return vec![G::zeroed()];
    }
    items.iter().map(convert).collect()
}

/// A scene flattened into device buffers.
#[derive(Debug, Clone)]
pub struct SceneBuffers {
    /// Scene-wide fields; per-tile fields are zero until [`GpuParams::for_tile`]
    pub header: GpuParams,
    pub materials: Vec<GpuMaterial>,
    pub lights: Vec<GpuLight>,
    pub spheres: Vec<GpuSphere>,
    pub planes: Vec<GpuPlane>,
    pub cylinders: Vec<GpuCylinder>,
}

impl SceneBuffers {
    pub fn from_scene(scene: &Scene) -> Self {
        let header = GpuParams {
            camera: widen(scene.camera.position, scene.camera.rotation),
            exposure: scene.exposure,
            field_of_view: scene.camera.field_of_view,
            skybox_material: scene.skybox_material_id as u32,
            num_lights: scene.lights.len() as u32,
            num_materials: scene.materials.len() as u32,
            num_spheres: scene.spheres.len() as u32,
            num_planes: scene.planes.len() as u32,
            num_cylinders: scene.cylinders.len() as u32,
            ..GpuParams::zeroed()
        };

        Self {
            header,
            materials: flatten(&scene.materials, |x| GpuMaterial::from(x)),
            lights: flatten(&scene.lights, |x| GpuLight::from(x)),
            spheres: flatten(&scene.spheres, |x| GpuSphere::from(x)),
            planes: flatten(&scene.planes, |x| GpuPlane::from(x)),
            cylinders: flatten(&scene.cylinders, |x| GpuCylinder::from(x)),
        }
    }

    /// Rebuild the scene these buffers describe, ignoring padding.
    pub fn to_scene(&self, name: &str) -> Scene {
        let h = &self.header;
        let take = |len: usize, count: u32| len.min(count as usize);

        Scene {
            name: name.to_string(),
            camera: Camera {
                position: narrow(h.camera),
                rotation: h.camera[3],
                field_of_view: h.field_of_view,
            },
            exposure: h.exposure,
            skybox_material_id: h.skybox_material as usize,
            materials: self.materials[..take(self.materials.len(), h.num_materials)]
                .iter()
                .map(Material::from)
                .collect(),
            lights: self.lights[..take(self.lights.len(), h.num_lights)]
                .iter()
                .map(|l| Light::new(narrow(l.position), narrow(l.intensity)))
                .collect(),
            spheres: self.spheres[..take(self.spheres.len(), h.num_spheres)]
                .iter()
                .map(|s| Sphere::new(narrow(s.center), s.center[3], s.material as usize))
                .collect(),
            planes: self.planes[..take(self.planes.len(), h.num_planes)]
                .iter()
                .map(|p| Plane {
                    point: narrow(p.point),
                    normal: narrow(p.normal),
                    material_id: p.material as usize,
                })
                .collect(),
            cylinders: self.cylinders[..take(self.cylinders.len(), h.num_cylinders)]
                .iter()
                .map(|c| Cylinder::new(narrow(c.p1), narrow(c.p2), c.p1[3], c.material as usize))
                .collect(),
        }
    }
}
