//! Point and area lights.

use std::f64::consts::TAU;

use prism_math::{generate_onb, Color, DVec3};
use serde::{Deserialize, Serialize};

/// Outline of an area light's emitting surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaShape {
    /// Side length `size_x` on both axes
    Square,
    Rectangle,
    /// Ellipse with diameters `size_x` and `size_y`
    Disk,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Point,
    Area {
        shape: AreaShape,
        size_x: f64,
        size_y: f64,
        /// Facing direction; the emitting surface is perpendicular to it
        normal: DVec3,
        /// Shadow samples used when the render config doesn't override them
        samples: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub name: String,
    pub position: DVec3,
    pub color: Color,
    pub intensity: f64,
    pub kind: LightKind,
}

impl Light {
    pub fn point(name: impl Into<String>, position: DVec3, color: Color, intensity: f64) -> Self {
        Self {
            name: name.into(),
            position,
            color,
            intensity,
            kind: LightKind::Point,
        }
    }

    /// Area light centred at `position`, facing (0, 0, -1) with 16 samples.
    pub fn area(
        name: impl Into<String>,
        position: DVec3,
        color: Color,
        intensity: f64,
        shape: AreaShape,
        size_x: f64,
        size_y: f64,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            color,
            intensity,
            kind: LightKind::Area {
                shape,
                size_x,
                size_y,
                normal: DVec3::NEG_Z,
                samples: 16,
            },
        }
    }

    /// Point the emitting surface along `normal`. No effect on point lights.
    pub fn facing(mut self, direction: DVec3) -> Self {
        if let LightKind::Area { normal, .. } = &mut self.kind {
            *normal = direction;
        }
        self
    }

    pub fn with_samples(mut self, count: u32) -> Self {
        if let LightKind::Area { samples, .. } = &mut self.kind {
            *samples = count;
        }
        self
    }

    pub fn is_area(&self) -> bool {
        matches!(self.kind, LightKind::Area { .. })
    }

    /// Shadow samples the light asks for; point lights always use one.
    pub fn sample_count(&self) -> u32 {
        match self.kind {
            LightKind::Point => 1,
            LightKind::Area { samples, .. } => samples.max(1),
        }
    }

    /// Radiance arriving at distance `distance`, before the global intensity factor.
    pub fn radiance_at(&self, distance: f64) -> Color {
        self.color * self.intensity / (distance * distance)
    }

    /// Map `(u, v)` in [0,1]^2 to a point on the light's surface.
    ///
    /// Point lights always return their position.
    pub fn sample_point(&self, u: f64, v: f64) -> DVec3 {
        let LightKind::Area {
            shape,
            size_x,
            size_y,
            normal,
            ..
        } = self.kind
        else {
            return self.position;
        };

        let facing = if normal.length_squared() < 0.1 {
            DVec3::NEG_Z
        } else {
            normal.normalize()
        };
        let frame = generate_onb(facing);
        let (right, up) = (frame.x_axis, frame.y_axis);

        match shape {
            AreaShape::Square => {
                self.position + right * ((u - 0.5) * size_x) + up * ((v - 0.5) * size_x)
            }
            AreaShape::Rectangle => {
                self.position + right * ((u - 0.5) * size_x) + up * ((v - 0.5) * size_y)
            }
            AreaShape::Disk => {
                let r = u.sqrt();
                let theta = TAU * v;
                let x = r * theta.cos() * size_x * 0.5;
                let y = r * theta.sin() * size_y * 0.5;
                self.position + right * x + up * y
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_samples_its_position() {
        let light = Light::point("key", DVec3::new(1.0, 2.0, 3.0), Color::ONE, 10.0);
        assert_eq!(light.sample_point(0.1, 0.9), light.position);
        assert_eq!(light.sample_count(), 1);
        assert!(!light.is_area());
    }

    #[test]
    fn test_rectangle_samples_stay_on_surface() {
        let center = DVec3::new(0.0, 0.0, 5.0);
        let light = Light::area("panel", center, Color::ONE, 1.0, AreaShape::Rectangle, 2.0, 4.0);

        assert_eq!(light.sample_point(0.5, 0.5), light.position);
        for &(u, v) in &[(0.0, 0.0), (1.0, 1.0), (0.25, 0.8)] {
            let p = light.sample_point(u, v);
            // Facing -z, so every sample lies in the z = 5 plane.
            assert!((p.z - 5.0).abs() < 1e-12);
            let offset = p - light.position;
            assert!(offset.x.abs().max(offset.y.abs()) <= 2.0 + 1e-12);
        }
        let corner = light.sample_point(1.0, 1.0) - light.position;
        assert!((corner.length_squared() - (1.0 + 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_disk_samples_within_radius() {
        let light = Light::area("disk", DVec3::ZERO, Color::ONE, 1.0, AreaShape::Disk, 2.0, 2.0)
            .facing(DVec3::Y)
            .with_samples(4);
        assert_eq!(light.sample_count(), 4);

        for i in 0..10 {
            for j in 0..10 {
                let p = light.sample_point(i as f64 / 9.0, j as f64 / 9.0);
                assert!(p.y.abs() < 1e-12);
                assert!(p.length() <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_radiance_inverse_square() {
        let light = Light::point("key", DVec3::ZERO, Color::new(1.0, 0.5, 0.25), 8.0);
        assert_eq!(light.radiance_at(2.0), Color::new(2.0, 1.0, 0.5));
    }
}
