//! Scene loading.
//!
//! Two formats are accepted:
//!
//! - **Sectioned text** (`.txt` and anything else): a `[Scene]` header section
//!   followed by numbered `[MaterialN]`, `[LightN]`, `[SphereN]`, `[PlaneN]`
//!   and `[CylinderN]` sections.
//! - **JSON** (`.json`): a serde rendition of [`Scene`].
//!
//! Both paths finish with [`Scene::validate`], so a successfully loaded scene
//! can be rendered without further checks.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::loader::load_scene;
//!
//! let scene = load_scene("scenes/allmaterials.txt")?;
//! ```

mod config;

use std::path::Path;

use lumen_math::Vec3;
use thiserror::Error;

use crate::scene::{Camera, Cylinder, Light, Material, MaterialKind, Plane, Scene, Sphere};

pub use config::{ConfigFile, Section};

/// Scene file version this loader understands.
pub const SCENE_VERSION: (u32, u32) = (1, 5);

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Missing section [{0}]")]
    MissingSection(String),

    #[error("Wrong scene file version {major}.{minor} (expected {}.{})", SCENE_VERSION.0, SCENE_VERSION.1)]
    Version { major: u32, minor: u32 },

    #[error("Invalid value for {section}.{key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Out of range field of view: {0} (must be in (0, 189))")]
    FieldOfView(f32),

    #[error("{kind} {index} references material {id}, but only {count} materials exist")]
    MaterialId {
        kind: &'static str,
        index: usize,
        id: usize,
        count: usize,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// On-disk scene encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    Text,
    Json,
}

impl SceneFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Load and validate a scene file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");

    log::info!("Loading scene from {}", path.display());
    let content = std::fs::read_to_string(path)?;

    let mut scene = load_scene_from_str(&content, SceneFormat::from_path(path))?;
    scene.name = name.to_string();

    log::info!(
        "Loaded '{}': {} materials, {} lights, {} objects",
        scene.name,
        scene.materials.len(),
        scene.lights.len(),
        scene.object_count()
    );
    Ok(scene)
}

/// Parse and validate a scene from memory.
pub fn load_scene_from_str(content: &str, format: SceneFormat) -> LoadResult<Scene> {
    let scene = match format {
        SceneFormat::Text => parse_text_scene(content)?,
        SceneFormat::Json => {
            let mut scene: Scene = serde_json::from_str(content)?;
            for plane in &mut scene.planes {
                plane.normal = plane.normal.normalize_or_zero();
            }
            scene
        }
    };

    scene.validate()?;
    Ok(scene)
}

fn parse_text_scene(content: &str) -> LoadResult<Scene> {
    let file = ConfigFile::parse(content)?;
    let header = file.section("Scene")?;

    let major = header.index_or("Version.Major", 0)? as u32;
    let minor = header.index_or("Version.Minor", 0)? as u32;
    if (major, minor) != SCENE_VERSION {
        return Err(LoadError::Version { major, minor });
    }

    // Rotation is stored negated so that positive angles turn the view right.
    let camera = Camera {
        position: header.vec3_or("Camera.Position", Vec3::ZERO)?,
        rotation: -header.float_or("Camera.Rotation", 45.0)?.to_radians(),
        field_of_view: header.float_or("Camera.FieldOfView", 45.0)?,
    };
    let mut scene = Scene {
        camera,
        exposure: header.float_or("Exposure", 1.0)?,
        skybox_material_id: header.index_or("Skybox.Material.Id", 0)?,
        ..Default::default()
    };

    let counts = [
        "NumberOfMaterials",
        "NumberOfLights",
        "NumberOfSpheres",
        "NumberOfPlanes",
        "NumberOfCylinders",
    ]
    .map(|key| header.index_or(key, 0));
    let [materials, lights, spheres, planes, cylinders] = counts;

    // Materials come first: every primitive refers to them by id.
    scene.materials = numbered(&file, "Material", materials?, read_material)?;
    scene.lights = numbered(&file, "Light", lights?, read_light)?;
    scene.spheres = numbered(&file, "Sphere", spheres?, read_sphere)?;
    scene.planes = numbered(&file, "Plane", planes?, read_plane)?;
    scene.cylinders = numbered(&file, "Cylinder", cylinders?, read_cylinder)?;

    log::debug!(
        "Parsed scene header: camera {:?}, exposure {}, sky {}",
        scene.camera,
        scene.exposure,
        scene.skybox_material_id
    );

    Ok(scene)
}

fn numbered<T>(
    file: &ConfigFile,
    prefix: &str,
    count: usize,
    read: fn(&Section) -> LoadResult<T>,
) -> LoadResult<Vec<T>> {
    (0..count)
        .map(|i| read(file.section(&format!("{}{}", prefix, i))?))
        .collect()
}

fn read_material(section: &Section) -> LoadResult<Material> {
    Ok(Material {
        kind: MaterialKind::from_name(&section.string_or("Type", "")),
        size: section.float_or("Size", 0.0)?,
        offset: section.vec3_or("Offset", Vec3::ZERO)?,
        diffuse: section.color_or("Diffuse", 0.0)?,
        diffuse2: section.color_or("Diffuse2", 0.0)?,
        specular: section.color_or("Specular", 0.0)?,
        power: section.float_or("Power", 0.0)?,
        reflection: section.float_or("Reflection", 0.0)?,
        refraction: section.float_or("Refraction", 0.0)?,
        density: section.float_or("Density", 0.0)?,
    })
}

fn read_light(section: &Section) -> LoadResult<Light> {
    Ok(Light::new(
        section.vec3_or("Position", Vec3::ZERO)?,
        section.color_or("Intensity", 0.0)?,
    ))
}

fn read_sphere(section: &Section) -> LoadResult<Sphere> {
    Ok(Sphere::new(
        section.vec3_or("Center", Vec3::ZERO)?,
        section.float_or("Size", 0.0)?,
        section.index_or("Material.Id", 0)?,
    ))
}

fn read_plane(section: &Section) -> LoadResult<Plane> {
    Ok(Plane::new(
        section.vec3_or("Center", Vec3::ZERO)?,
        section.vec3_or("Normal", Vec3::ZERO)?,
        section.index_or("Material.Id", 0)?,
    ))
}

fn read_cylinder(section: &Section) -> LoadResult<Cylinder> {
    Ok(Cylinder::new(
        section.vec3_or("Point1", Vec3::ZERO)?,
        section.vec3_or("Point2", Vec3::ZERO)?,
        section.float_or("Size", 0.0)?,
        section.index_or("Material.Id", 0)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = "
        [Scene]
        Version.Major = 1
        Version.Minor = 5
        Camera.Position = 0.0 0.0 -10.0
        Camera.Rotation = 0.0
        Camera.FieldOfView = 90.0
        Exposure = 1.5
        Skybox.Material.Id = 0
        NumberOfMaterials = 2
        NumberOfLights = 1
        NumberOfSpheres = 1
        NumberOfPlanes = 1
        NumberOfCylinders = 1

        [Material0]
        Diffuse = 0.1 0.2 0.3

        [Material1]
        Type = wood
        Size = 2.0
        Diffuse = 1.0
        Diffuse2 = 0.5 0.25 0.0
        Reflection = 0.5
        Refraction = 0.25
        Density = 1.33

        [Light0]
        Position = 0.0 10.0 0.0
        Intensity = 1.0

        [Sphere0]
        Center = 0.0 0.0 5.0
        Size = 1.0
        Material.Id = 1

        [Plane0]
        Center = 0.0 -1.0 0.0
        Normal = 0.0 3.0 0.0
        Material.Id = 0

        [Cylinder0]
        Point1 = 0.0 0.0 0.0
        Point2 = 0.0 2.0 0.0
        Size = 0.5
        Material.Id = 1
    ";

    #[test]
    fn test_load_text_scene() {
        let scene = load_scene_from_str(SCENE, SceneFormat::Text).unwrap();

        assert_eq!(scene.camera.position, Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(scene.camera.field_of_view, 90.0);
        assert_eq!(scene.exposure, 1.5);
        assert_eq!(scene.materials.len(), 2);
        assert_eq!(scene.lights[0].intensity, Vec3::ONE);
        assert_eq!(scene.spheres[0].material_id, 1);
        assert_eq!(scene.planes[0].normal, Vec3::Y);
        assert_eq!(scene.cylinders[0].radius, 0.5);

        let wood = &scene.materials[1];
        assert_eq!(wood.kind, MaterialKind::Wood);
        assert_eq!(wood.diffuse2, Vec3::new(0.5, 0.25, 0.0));
        assert_eq!(wood.density, 1.33);
    }

    #[test]
    fn test_camera_rotation_is_negated_radians() {
        let text = SCENE.replace("Camera.Rotation = 0.0", "Camera.Rotation = 90.0");
        let scene = load_scene_from_str(&text, SceneFormat::Text).unwrap();
        assert!((scene.camera.rotation + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let text = SCENE.replace("Version.Minor = 5", "Version.Minor = 4");
        assert!(matches!(
            load_scene_from_str(&text, SceneFormat::Text),
            Err(LoadError::Version { major: 1, minor: 4 })
        ));
    }

    #[test]
    fn test_out_of_range_fov_is_rejected() {
        let text = SCENE.replace("Camera.FieldOfView = 90.0", "Camera.FieldOfView = 200.0");
        assert!(matches!(
            load_scene_from_str(&text, SceneFormat::Text),
            Err(LoadError::FieldOfView(_))
        ));
    }

    #[test]
    fn test_dangling_material_id_is_rejected() {
        let text = SCENE.replace(
            "Size = 1.0\n        Material.Id = 1",
            "Size = 1.0\n        Material.Id = 9",
        );
        assert!(matches!(
            load_scene_from_str(&text, SceneFormat::Text),
            Err(LoadError::MaterialId { kind: "Sphere", id: 9, .. })
        ));
    }

    #[test]
    fn test_missing_numbered_section() {
        let text = SCENE.replace("NumberOfLights = 1", "NumberOfLights = 2");
        assert!(matches!(
            load_scene_from_str(&text, SceneFormat::Text),
            Err(LoadError::MissingSection(name)) if name == "Light1"
        ));
    }

    #[test]
    fn test_json_scene_matches_text_scene() {
        let text_scene = load_scene_from_str(SCENE, SceneFormat::Text).unwrap();
        let json = serde_json::to_string(&text_scene).unwrap();
        let json_scene = load_scene_from_str(&json, SceneFormat::Json).unwrap();

        assert_eq!(json_scene.materials, text_scene.materials);
        assert_eq!(json_scene.spheres, text_scene.spheres);
        assert_eq!(json_scene.camera, text_scene.camera);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SceneFormat::from_path(Path::new("a/b.json")), SceneFormat::Json);
        assert_eq!(SceneFormat::from_path(Path::new("a/b.txt")), SceneFormat::Text);
        assert_eq!(SceneFormat::from_path(Path::new("noext")), SceneFormat::Text);
    }

    #[test]
    fn test_bundled_scene_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes/allmaterials.txt");
        let scene = load_scene(&path).unwrap();

        assert_eq!(scene.name, "allmaterials");
        assert_eq!(scene.materials.len(), 7);
        assert_eq!(scene.object_count(), 7);
        assert_eq!(scene.materials[1].kind, MaterialKind::Checkerboard);
        assert_eq!(scene.materials[5].kind, MaterialKind::Circles);
    }
}
