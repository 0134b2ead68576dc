//! Thin-lens camera for primary ray generation.
//!
//! Lens dimensions follow photographic conventions: focal length and sensor size
//! in millimetres, where one scene unit is one metre.

use std::f64::consts::TAU;

use prism_math::{DVec2, DVec3, Ray};
use serde::{Deserialize, Serialize};

/// Millimetres to scene units.
const MM_TO_UNITS: f64 = 0.001;

/// Camera for generating rays into the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub name: String,

    // Camera positioning
    pub location: DVec3,
    pub gaze: DVec3,
    pub up: DVec3,

    // Lens settings (millimetres)
    pub focal_length: f64,
    pub sensor_width: f64,
    pub sensor_height: f64,

    // Depth of field
    pub dof_enabled: bool,
    pub focus_distance: f64,
    pub aperture_fstop: f64,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            name: String::from("camera"),
            location: DVec3::ZERO,
            gaze: DVec3::NEG_Z,
            up: DVec3::Y,
            focal_length: 50.0,
            sensor_width: 36.0,
            sensor_height: 24.0,
            dof_enabled: false,
            focus_distance: 10.0,
            aperture_fstop: 2.8,
        }
    }

    /// Set camera position and orientation.
    pub fn with_position(mut self, location: DVec3, gaze: DVec3, up: DVec3) -> Self {
        self.location = location;
        self.gaze = gaze;
        self.up = up;
        self
    }

    /// Aim at a point instead of giving a gaze direction.
    pub fn looking_at(mut self, location: DVec3, target: DVec3, up: DVec3) -> Self {
        self.location = location;
        self.gaze = target - location;
        self.up = up;
        self
    }

    /// Set lens and sensor size in millimetres.
    pub fn with_lens(mut self, focal_length: f64, sensor_width: f64, sensor_height: f64) -> Self {
        self.focal_length = focal_length;
        self.sensor_width = sensor_width;
        self.sensor_height = sensor_height;
        self
    }

    /// Enable thin-lens depth of field.
    pub fn with_depth_of_field(mut self, focus_distance: f64, fstop: f64) -> Self {
        self.dof_enabled = true;
        self.focus_distance = focus_distance;
        self.aperture_fstop = fstop;
        self
    }

    /// Aperture radius in scene units, zero when depth of field is off.
    pub fn aperture_radius(&self) -> f64 {
        if self.dof_enabled && self.aperture_fstop > 0.0 {
            self.focal_length * MM_TO_UNITS / (2.0 * self.aperture_fstop)
        } else {
            0.0
        }
    }

    /// Generate a ray through image position `(x, y)` in pixels.
    ///
    /// `(x, y)` may be fractional for sub-pixel jitter; row 0 is the top of the
    /// image. `lens` is a uniform sample in [0,1]^2, ignored without depth of field.
    pub fn get_ray(&self, x: f64, y: f64, width: u32, height: u32, time: f64, lens: DVec2) -> Ray {
        let gaze = self.gaze.normalize();
        let w = -gaze;
        let u = self.up.cross(w).normalize();
        let v = w.cross(u);

        let viewport_h = self.sensor_height * MM_TO_UNITS;
        let viewport_w = viewport_h * (width as f64 / height as f64);

        let viewport_x = (x / width as f64 - 0.5) * viewport_w;
        let viewport_y = (0.5 - y / height as f64) * viewport_h;
        let image_plane_dist = self.focal_length * MM_TO_UNITS;

        let image_point = self.location - w * image_plane_dist + u * viewport_x + v * viewport_y;
        let direction = (image_point - self.location).normalize();

        let aperture = self.aperture_radius();
        if aperture <= 0.0 {
            return Ray::new(self.location, direction, time);
        }

        // Where the pinhole ray meets the plane of focus.
        let t = self.focus_distance / gaze.dot(direction);
        let focus_point = self.location + direction * t;

        let r = aperture * lens.x.sqrt();
        let theta = TAU * lens.y;
        let lens_point = self.location + u * (r * theta.cos()) + v * (r * theta.sin());

        Ray::new(lens_point, (focus_point - lens_point).normalize(), time)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
