//! Prism Renderer - recursive stochastic ray tracing on the CPU.
//!
//! Shapes are intersected analytically in object space (the torus through a
//! quartic solve), found through a BVH, and shaded by a Whitted-style integrator
//! with soft shadows, glossy reflection and Fresnel refraction. Images render
//! row-parallel with rayon.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_core::{Camera, Light, Material, Scene, Shape, TextureStore};
//! use prism_math::DVec3;
//! use prism_renderer::{RenderConfig, Renderer};
//!
//! let mut scene = Scene::new("demo");
//! scene.add_shape(Shape::sphere("ball", Arc::new(Material::new("white", DVec3::ONE))));
//! scene.add_light(Light::point("key", DVec3::new(2.0, 4.0, 6.0), DVec3::ONE, 50.0));
//! let eye = DVec3::new(0.0, 0.0, 5.0);
//! scene.add_camera(Camera::new().with_position(eye, DVec3::NEG_Z, DVec3::Y));
//!
//! let textures = TextureStore::new();
//! let renderer = Renderer::new(&scene, &textures, RenderConfig::default())?;
//! let output = renderer.render_camera(0, 320, 240)?;
//! assert_eq!(output.image.width, 320);
//! # Ok::<(), prism_renderer::RenderError>(())
//! ```

pub mod bvh;
pub mod config;
mod hittable;
pub mod integrator;
pub mod renderer;
pub mod sampling;
pub mod shapes;

pub use bvh::{Bvh, BvhNode, BvhStats};
pub use config::{ConfigError, RenderConfig, ToneMapping};
pub use hittable::{closest_hit_brute_force, HitRecord, Hittable};
pub use integrator::Integrator;
pub use renderer::{ImageBuffer, RenderError, RenderOutput, RenderStats, Renderer};
pub use shapes::solve_quartic;
