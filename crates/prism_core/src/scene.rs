//! Scene container handed to the renderer.
//!
//! Built by whatever loads the scene; the renderer only reads it.

use std::sync::Arc;

use prism_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::texture::ColorSpace;
use crate::{Camera, Light, Material, Shape};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("Scene '{0}' has no camera")]
    NoCamera(String),

    #[error("Camera index {index} out of range ({count} cameras)")]
    CameraIndex { index: usize, count: usize },
}

/// Background and ambient settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub background_color: Color,
    pub background_strength: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            background_color: Color::new(0.05, 0.05, 0.08),
            background_strength: 1.0,
        }
    }
}

impl SceneSettings {
    /// Radiance returned for rays that escape the scene.
    pub fn background(&self) -> Color {
        self.background_color * self.background_strength
    }
}

/// Shapes, lights and cameras making up one render.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: String,
    pub settings: SceneSettings,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a shape and return its index.
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.push(camera);
    }

    /// The first camera.
    pub fn primary_camera(&self) -> Result<&Camera, SceneError> {
        self.cameras
            .first()
            .ok_or_else(|| SceneError::NoCamera(self.name.clone()))
    }

    pub fn camera(&self, index: usize) -> Result<&Camera, SceneError> {
        self.cameras.get(index).ok_or(SceneError::CameraIndex {
            index,
            count: self.cameras.len(),
        })
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Distinct materials, by pointer identity.
    pub fn materials(&self) -> Vec<Arc<Material>> {
        let mut seen: Vec<Arc<Material>> = Vec::new();
        for shape in &self.shapes {
            if !seen.iter().any(|m| Arc::ptr_eq(m, &shape.material)) {
                seen.push(shape.material.clone());
            }
        }
        seen
    }

    /// Every texture referenced by a material, with the color space it is stored in.
    pub fn texture_requests(&self) -> Vec<(String, ColorSpace)> {
        let mut requests: Vec<(String, ColorSpace)> = Vec::new();
        for material in self.materials() {
            for (name, space) in material.texture_names() {
                if !requests.iter().any(|(n, _)| n == name) {
                    requests.push((name.to_string(), space));
                }
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::DVec3;

    #[test]
    fn test_scene_creation() {
        let mut scene = Scene::new("test");
        let material = Arc::new(Material::default());

        assert_eq!(scene.add_shape(Shape::sphere("a", material.clone())), 0);
        assert_eq!(scene.add_shape(Shape::cube("b", material)), 1);
        scene.add_light(Light::point("key", DVec3::new(0.0, 5.0, 0.0), Color::ONE, 50.0));

        assert_eq!(scene.shape_count(), 2);
        assert_eq!(scene.materials().len(), 1);
        assert_eq!(scene.lights.len(), 1);
    }

    #[test]
    fn test_camera_lookup() {
        let mut scene = Scene::new("empty");
        assert_eq!(scene.primary_camera(), Err(SceneError::NoCamera("empty".into())));

        scene.add_camera(Camera::new());
        assert!(scene.primary_camera().is_ok());
        assert_eq!(
            scene.camera(3).unwrap_err(),
            SceneError::CameraIndex { index: 3, count: 1 }
        );
    }

    #[test]
    fn test_texture_requests_are_deduplicated() {
        let mut scene = Scene::new("textured");
        let wood = Arc::new(
            Material::default()
                .with_texture("wood.png")
                .with_normal_map("wood_n.png", 1.0),
        );
        let floor = Arc::new(Material::default().with_texture("wood.png"));
        scene.add_shape(Shape::sphere("a", wood.clone()));
        scene.add_shape(Shape::sphere("b", wood));
        scene.add_shape(Shape::cube("c", floor));

        let requests = scene.texture_requests();
        assert_eq!(
            requests,
            vec![
                ("wood.png".to_string(), ColorSpace::Srgb),
                ("wood_n.png".to_string(), ColorSpace::Linear),
            ]
        );
    }

    #[test]
    fn test_background_strength() {
        let settings = SceneSettings {
            background_color: Color::new(0.5, 0.25, 1.0),
            background_strength: 2.0,
        };
        assert_eq!(settings.background(), Color::new(1.0, 0.5, 2.0));
    }
}
