//! Scene model for Lumen.
//!
//! Everything the tracer needs is stored here fully resolved: materials are
//! referenced by index, light and primitive collections are plain vectors,
//! and the camera is reduced to a position, a yaw angle and a field of view.

use lumen_math::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::loader::{LoadError, LoadResult};

/// Refractive index of the space between objects.
pub const DEFAULT_REFRACTIVE_INDEX: f32 = 1.0;

/// Upper bound (exclusive) on the camera field of view, in degrees.
pub const MAX_FIELD_OF_VIEW: f32 = 189.0;

/// How a material computes its diffuse colour at a surface point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    /// Flat colour: `diffuse` everywhere.
    #[default]
    Gouraud,
    /// Alternating tiles of `diffuse` and `diffuse2`.
    Checkerboard,
    /// Soft concentric rings blending `diffuse` into `diffuse2`.
    Wood,
    /// Hard-edged concentric rings.
    Circles,
}

impl MaterialKind {
    /// Parse a material type name as written in scene files.
    ///
    /// Unknown names fall back to [`MaterialKind::Gouraud`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "checkerboard" => Self::Checkerboard,
            "wood" => Self::Wood,
            "circles" => Self::Circles,
            _ => Self::Gouraud,
        }
    }

    /// Stable numeric tag used by flat device buffers.
    pub fn tag(self) -> u32 {
        match self {
            Self::Gouraud => 0,
            Self::Checkerboard => 1,
            Self::Wood => 2,
            Self::Circles => 3,
        }
    }

    /// Inverse of [`MaterialKind::tag`]. Unknown tags decode as Gouraud.
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            1 => Self::Checkerboard,
            2 => Self::Wood,
            3 => Self::Circles,
            _ => Self::Gouraud,
        }
    }
}

/// Surface material.
///
/// `reflection` and `refraction` are independent weights. When both are
/// non-zero only reflection is followed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub kind: MaterialKind,

    /// Pattern scale for procedural kinds
    pub size: f32,

    /// Pattern-space translation for procedural kinds
    pub offset: Vec3,

    /// Primary diffuse colour
    pub diffuse: Color,

    /// Secondary diffuse colour (procedural kinds only)
    pub diffuse2: Color,

    /// Specular colour
    pub specular: Color,

    /// Specular exponent
    pub power: f32,

    /// Mirror weight in [0, 1]
    pub reflection: f32,

    /// Transmission weight in [0, 1]
    pub refraction: f32,

    /// Refractive index inside the material
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Gouraud,
            size: 0.0,
            offset: Vec3::ZERO,
            diffuse: Color::ZERO,
            diffuse2: Color::ZERO,
            specular: Color::ZERO,
            power: 0.0,
            reflection: 0.0,
            refraction: 0.0,
            density: 0.0,
        }
    }
}

impl Material {
    /// Create a flat-coloured, fully diffuse material.
    pub fn diffuse(diffuse: Color) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }

    /// Create a procedural material alternating between two colours.
    pub fn pattern(kind: MaterialKind, diffuse: Color, diffuse2: Color, size: f32) -> Self {
        Self {
            kind,
            diffuse,
            diffuse2,
            size,
            ..Default::default()
        }
    }

    /// Set the specular colour and exponent.
    pub fn with_specular(mut self, specular: Color, power: f32) -> Self {
        self.specular = specular;
        self.power = power;
        self
    }

    /// Set the mirror weight.
    pub fn with_reflection(mut self, reflection: f32) -> Self {
        self.reflection = reflection;
        self
    }

    /// Set the transmission weight and the refractive index inside the material.
    pub fn with_refraction(mut self, refraction: f32, density: f32) -> Self {
        self.refraction = refraction;
        self.density = density;
        self
    }

    /// Set the pattern offset.
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// A point light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub intensity: Color,
}

impl Light {
    pub fn new(position: Vec3, intensity: Color) -> Self {
        Self {
            position,
            intensity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material_id: usize,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material_id: usize) -> Self {
        Self {
            center,
            radius,
            material_id,
        }
    }
}

/// An infinite plane through `point`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Vec3,
    /// Unit normal
    pub normal: Vec3,
    pub material_id: usize,
}

impl Plane {
    /// Create a plane. The normal is normalised here.
    pub fn new(point: Vec3, normal: Vec3, material_id: usize) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
            material_id,
        }
    }
}

/// A finite cylinder between two end points, closed by flat caps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub p1: Vec3,
    pub p2: Vec3,
    pub radius: f32,
    pub material_id: usize,
}

impl Cylinder {
    pub fn new(p1: Vec3, p2: Vec3, radius: f32, material_id: usize) -> Self {
        Self {
            p1,
            p2,
            radius,
            material_id,
        }
    }

    /// Unit axis from `p1` towards `p2`.
    pub fn axis(&self) -> Vec3 {
        (self.p2 - self.p1).normalize_or_zero()
    }

    /// Distance between the two caps.
    pub fn height(&self) -> f32 {
        (self.p2 - self.p1).length()
    }
}

/// Pinhole camera looking down +Z before rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Yaw about +Y in radians
    pub rotation: f32,
    /// Horizontal field of view in degrees
    pub field_of_view: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: 0.0,
            field_of_view: 45.0,
        }
    }
}

/// A complete, immutable scene.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    pub camera: Camera,

    /// Divisor applied to colours before saturation
    pub exposure: f32,

    /// Material whose diffuse colour is returned for rays that leave the scene
    pub skybox_material_id: usize,

    pub materials: Vec<Material>,
    pub lights: Vec<Light>,
    pub spheres: Vec<Sphere>,
    pub planes: Vec<Plane>,
    pub cylinders: Vec<Cylinder>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: String::new(),
            camera: Camera::default(),
            exposure: 1.0,
            skybox_material_id: 0,
            materials: Vec::new(),
            lights: Vec::new(),
            spheres: Vec::new(),
            planes: Vec::new(),
            cylinders: Vec::new(),
        }
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a material and return its id.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Look up a material by id.
    ///
    /// Ids are checked by [`Scene::validate`]; an invalid id here is a bug.
    #[inline]
    pub fn material(&self, id: usize) -> &Material {
        &self.materials[id]
    }

    /// The environment material.
    #[inline]
    pub fn skybox(&self) -> &Material {
        self.material(self.skybox_material_id)
    }

    /// Total number of primitives.
    pub fn object_count(&self) -> usize {
        self.spheres.len() + self.planes.len() + self.cylinders.len()
    }

    /// Check the invariants the tracer relies on.
    pub fn validate(&self) -> LoadResult<()> {
        let fov = self.camera.field_of_view;
        if !(fov > 0.0 && fov < MAX_FIELD_OF_VIEW) {
            return Err(LoadError::FieldOfView(fov));
        }

        let count = self.materials.len();
        if self.skybox_material_id >= count {
            return Err(LoadError::MaterialId {
                kind: "Skybox",
                index: 0,
                id: self.skybox_material_id,
                count,
            });
        }

        let ids = self
            .spheres
            .iter()
            .enumerate()
            .map(|(i, s)| ("Sphere", i, s.material_id))
            .chain(self.planes.iter().enumerate().map(|(i, p)| ("Plane", i, p.material_id)))
            .chain(
                self.cylinders
                    .iter()
                    .enumerate()
                    .map(|(i, c)| ("Cylinder", i, c.material_id)),
            );

        for (kind, index, id) in ids {
            if id >= count {
                return Err(LoadError::MaterialId {
                    kind,
                    index,
                    id,
                    count,
                });
            }
        }

        Ok(())
    }

    /// Log a short description of the scene contents.
    ///
    /// Long collections are elided to their first and last three entries.
    pub fn log_summary(&self) {
        log::info!("--- Scene '{}'", self.name);
        log::info!(
            "camera: pos {:?}, rot {:.2} rad, fov {:.1}, exposure {:.2}, sky material {}",
            self.camera.position,
            self.camera.rotation,
            self.camera.field_of_view,
            self.exposure,
            self.skybox_material_id
        );

        log_elided("Spheres", &self.spheres, |i, s| {
            format!("Sphere {}: {:?}, r {:.2} -- {}", i, s.center, s.radius, s.material_id)
        });
        log_elided("Planes", &self.planes, |i, p| {
            format!("Plane {}: {:?}, n {:?} -- {}", i, p.point, p.normal, p.material_id)
        });
        log_elided("Cylinders", &self.cylinders, |i, c| {
            format!(
                "Cylinder {}: {:?} -> {:?}, r {:.2} -- {}",
                i, c.p1, c.p2, c.radius, c.material_id
            )
        });
        log_elided("Lights", &self.lights, |i, l| {
            format!("Light {}: {:?} -- {:?}", i, l.position, l.intensity)
        });
        log_elided("Materials", &self.materials, |i, m| {
            format!(
                "Material {}: {:?} {:?} ... refl {:.2} refr {:.2} density {:.2}",
                i, m.kind, m.diffuse, m.reflection, m.refraction, m.density
            )
        });
    }
}

fn log_elided<T>(title: &str, items: &[T], describe: impl Fn(usize, &T) -> String) {
    log::info!("--- {} ({})", title, items.len());
    let len = items.len();
    for (i, item) in items.iter().enumerate() {
        if len > 10 && (3..len - 3).contains(&i) {
            if i == 3 {
                log::info!(" ... ");
            }
            continue;
        }
        log::info!("{}", describe(i, item));
    }
}
