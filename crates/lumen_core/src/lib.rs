//! Lumen Core - Scene model and scene-file loading.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Material`, `Light`, `Sphere`, `Plane`, `Cylinder`
//! - **Loading**: the sectioned text scene format and JSON scenes
//!
//! A `Scene` is built once and then only read. Renderers share it by
//! reference across worker threads.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("scenes/allmaterials.txt")?;
//! println!("Loaded {} objects, {} lights",
//!     scene.object_count(),
//!     scene.lights.len());
//! ```

pub mod loader;
pub mod scene;

// Re-export commonly used types
pub use loader::{load_scene, load_scene_from_str, LoadError, LoadResult, SceneFormat};
pub use scene::{
    Camera, Cylinder, Light, Material, MaterialKind, Plane, Scene, Sphere,
    DEFAULT_REFRACTIVE_INDEX, MAX_FIELD_OF_VIEW,
};
