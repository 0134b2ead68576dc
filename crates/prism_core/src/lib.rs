//! Prism Core - scene description consumed by the renderer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Shape`, `Material`, `Light`, `Camera`
//! - **Textures**: a preloaded `TextureStore` behind the `TextureSource` trait
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use prism_core::{Camera, Material, Scene, Shape};
//! use prism_math::DVec3;
//!
//! let mut scene = Scene::new("demo");
//! let white = Arc::new(Material::new("white", DVec3::ONE));
//! scene.add_shape(Shape::sphere("ball", white));
//! let eye = DVec3::new(0.0, 0.0, 5.0);
//! scene.add_camera(Camera::new().with_position(eye, DVec3::NEG_Z, DVec3::Y));
//! assert_eq!(scene.shape_count(), 1);
//! ```

pub mod camera;
pub mod light;
pub mod material;
pub mod scene;
pub mod shape;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use light::{AreaShape, Light, LightKind};
pub use material::Material;
pub use scene::{Scene, SceneError, SceneSettings};
pub use shape::{Shape, ShapeKind};
pub use texture::{
    ColorSpace, Texture, TextureError, TextureResult, TextureSource, TextureStore,
    MISSING_TEXTURE_COLOR,
};
