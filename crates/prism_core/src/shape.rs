//! Scene primitives: shape parameters, placement and material.
//!
//! Geometry is described in object space against canonical shapes; the renderer
//! implements intersection on top of these definitions.

use std::sync::Arc;

use prism_math::{DMat4, DVec3, Motion, Transform};

use crate::Material;

/// Canonical object-space geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// Unit sphere at the origin.
    Sphere,
    /// Axis-aligned box spanning [-1, 1] on every axis.
    Cube,
    /// Planar polygon through the given points. Needs at least three.
    Polygon { points: Vec<DVec3> },
    /// Ring in the xy-plane around the z axis.
    Torus { major_radius: f64, minor_radius: f64 },
    /// Capped cylinder along z, spanning z in [-depth/2, depth/2].
    Cylinder { radius: f64, depth: f64 },
    /// Cone along z with its base at -depth/2 and apex at +depth/2.
    Cone { radius: f64, depth: f64 },
}

/// A primitive placed in the scene.
#[derive(Clone, Debug)]
pub struct Shape {
    pub name: String,
    pub kind: ShapeKind,
    pub material: Arc<Material>,
    pub visible: bool,
    /// Static object->world transform, used when `motion` is absent
    pub transform: Transform,
    /// Start/end transforms over the shutter interval
    pub motion: Option<Motion>,
}

impl Shape {
    pub fn new(name: impl Into<String>, kind: ShapeKind, material: Arc<Material>) -> Self {
        Self {
            name: name.into(),
            kind,
            material,
            visible: true,
            transform: Transform::IDENTITY,
            motion: None,
        }
    }

    pub fn sphere(name: impl Into<String>, material: Arc<Material>) -> Self {
        Self::new(name, ShapeKind::Sphere, material)
    }

    pub fn cube(name: impl Into<String>, material: Arc<Material>) -> Self {
        Self::new(name, ShapeKind::Cube, material)
    }

    pub fn polygon(name: impl Into<String>, points: Vec<DVec3>, material: Arc<Material>) -> Self {
        Self::new(name, ShapeKind::Polygon { points }, material)
    }

    pub fn torus(
        name: impl Into<String>,
        major_radius: f64,
        minor_radius: f64,
        material: Arc<Material>,
    ) -> Self {
        Self::new(name, ShapeKind::Torus { major_radius, minor_radius }, material)
    }

    pub fn cylinder(
        name: impl Into<String>,
        radius: f64,
        depth: f64,
        material: Arc<Material>,
    ) -> Self {
        Self::new(name, ShapeKind::Cylinder { radius, depth }, material)
    }

    pub fn cone(name: impl Into<String>, radius: f64, depth: f64, material: Arc<Material>) -> Self {
        Self::new(name, ShapeKind::Cone { radius, depth }, material)
    }

    /// Place with translation, Euler rotation (radians) and per-axis scale.
    pub fn with_trs(mut self, translation: DVec3, rotation: DVec3, scale: DVec3) -> Self {
        self.transform = Transform::from_trs(translation, rotation, scale);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Move from `start` to `end` over the shutter interval.
    pub fn with_motion(mut self, start: DMat4, end: DMat4) -> Self {
        self.transform = Transform::from_matrix(start);
        self.motion = Some(Motion::new(&start, &end));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// The transform in effect at shutter time `time`.
    pub fn transform_at(&self, time: f64) -> Transform {
        match &self.motion {
            Some(motion) => Transform::from_matrix(motion.matrix_at(time)),
            None => self.transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::trs_matrix;

    #[test]
    fn test_static_shape_uses_cached_transform() {
        let shape = Shape::sphere("ball", Arc::new(Material::default()))
            .with_trs(DVec3::new(1.0, 2.0, 3.0), DVec3::ZERO, DVec3::ONE);

        assert!(!shape.is_moving());
        assert_eq!(shape.transform_at(0.7), shape.transform);
        assert_eq!(shape.transform_at(0.0).point_to_world(DVec3::ZERO), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_moving_shape_interpolates() {
        let start = trs_matrix(DVec3::ZERO, DVec3::ZERO, DVec3::ONE);
        let end = trs_matrix(DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO, DVec3::ONE);
        let shape = Shape::cube("box", Arc::new(Material::default())).with_motion(start, end);

        assert!(shape.is_moving());
        let mid = shape.transform_at(0.5).point_to_world(DVec3::ZERO);
        assert!((mid - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_hidden_and_kind() {
        let m = Arc::new(Material::default());
        let torus = Shape::torus("t", 2.0, 0.5, m.clone());
        assert!(matches!(torus.kind, ShapeKind::Torus { major_radius, .. } if major_radius == 2.0));
        assert!(!Shape::cone("c", 1.0, 2.0, m).hidden().visible);
    }
}
