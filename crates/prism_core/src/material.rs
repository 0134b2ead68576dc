//! Surface description read by the integrator.

use prism_math::{Color, DVec3};
use serde::{Deserialize, Serialize};

use crate::texture::ColorSpace;

/// A Blinn-Phong material with mirror, glass and emission terms.
///
/// Texture fields hold names resolved by a [`crate::TextureSource`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,

    /// Base color (kd)
    pub diffuse_color: Color,

    /// Specular highlight color (ks)
    pub specular_color: Color,

    /// Ambient color (ka)
    pub ambient_color: Color,

    /// Blinn-Phong exponent
    pub shininess: f64,

    /// Sharpness of glossy reflections; 1.0 is a perfect mirror
    pub glossiness: f64,

    /// Mirror reflection coefficient (kr)
    pub reflectivity: f64,

    /// Transmission coefficient (kt)
    pub transparency: f64,

    /// Index of refraction
    pub refractive_index: f64,

    pub emission_color: Color,
    pub emission_strength: f64,

    /// Diffuse texture name
    pub texture: Option<String>,

    /// Tangent-space normal map name
    pub normal_map: Option<String>,

    /// Grayscale height map name
    pub bump_map: Option<String>,

    pub bump_strength: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Color::splat(0.8),
            specular_color: Color::ONE,
            ambient_color: Color::splat(0.1),
            shininess: 32.0,
            glossiness: 0.0,
            reflectivity: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
            emission_color: Color::ZERO,
            emission_strength: 0.0,
            texture: None,
            normal_map: None,
            bump_map: None,
            bump_strength: 1.0,
        }
    }
}

impl Material {
    /// Create a new material with just a name and diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Color) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
            ..Default::default()
        }
    }

    /// Clear glass with the given index of refraction.
    pub fn glass(name: impl Into<String>, refractive_index: f64) -> Self {
        Self {
            name: name.into(),
            diffuse_color: Color::ZERO,
            specular_color: Color::ONE,
            ambient_color: Color::ZERO,
            shininess: 128.0,
            transparency: 1.0,
            refractive_index,
            ..Default::default()
        }
    }

    /// Reflective metal tinted by `color`.
    pub fn metal(name: impl Into<String>, color: Color, glossiness: f64) -> Self {
        Self {
            name: name.into(),
            diffuse_color: color,
            reflectivity: 0.9,
            glossiness,
            ..Default::default()
        }
    }

    /// A surface that only emits light.
    pub fn emissive(name: impl Into<String>, color: Color, strength: f64) -> Self {
        Self {
            name: name.into(),
            diffuse_color: Color::ZERO,
            specular_color: Color::ZERO,
            ambient_color: Color::ZERO,
            emission_color: color,
            emission_strength: strength,
            ..Default::default()
        }
    }

    pub fn with_texture(mut self, name: impl Into<String>) -> Self {
        self.texture = Some(name.into());
        self
    }

    pub fn with_normal_map(mut self, name: impl Into<String>, strength: f64) -> Self {
        self.normal_map = Some(name.into());
        self.bump_strength = strength;
        self
    }

    pub fn with_bump_map(mut self, name: impl Into<String>, strength: f64) -> Self {
        self.bump_map = Some(name.into());
        self.bump_strength = strength;
        self
    }

    /// Blinn-Phong BRDF: `albedo + ks * max(0, n.h)^shininess`.
    ///
    /// `albedo` is passed in so texture-modulated colors can be used. The caller
    /// applies the `n.l` cosine term.
    pub fn eval(&self, view_dir: DVec3, light_dir: DVec3, normal: DVec3, albedo: Color) -> Color {
        let halfway = (light_dir + view_dir).normalize_or_zero();
        let n_dot_h = normal.dot(halfway).max(0.0);
        if n_dot_h > 0.0 {
            albedo + self.specular_color * n_dot_h.powf(self.shininess)
        } else {
            albedo
        }
    }

    /// Emitted radiance.
    pub fn emission(&self) -> Color {
        self.emission_color * self.emission_strength
    }

    pub fn is_emissive(&self) -> bool {
        self.emission_strength > 0.0 && self.emission_color.max_element() > 0.0
    }

    /// High reflectivity with negligible transmission; reflections take the base color.
    pub fn is_metal(&self) -> bool {
        self.reflectivity > 0.5 && self.transparency < 0.1
    }

    /// Every referenced texture with the color space it is stored in.
    ///
    /// Color textures are sRGB; normal and bump maps hold linear data.
    pub fn texture_names(&self) -> impl Iterator<Item = (&str, ColorSpace)> {
        [
            (&self.texture, ColorSpace::Srgb),
            (&self.normal_map, ColorSpace::Linear),
            (&self.bump_map, ColorSpace::Linear),
        ]
        .into_iter()
        .filter_map(|(name, space)| name.as_deref().map(|name| (name, space)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_without_specular_is_albedo() {
        let mut material = Material::new("matte", Color::new(0.2, 0.4, 0.6));
        material.specular_color = Color::ZERO;

        let n = DVec3::Z;
        let brdf = material.eval(n, n, n, material.diffuse_color);
        assert!((brdf - material.diffuse_color).length() < 1e-12);
    }

    #[test]
    fn test_eval_specular_peak_on_mirror_direction() {
        let material = Material::default();
        let n = DVec3::Z;
        let on_peak = material.eval(n, n, n, Color::ZERO);
        let off_peak = material.eval(n, DVec3::new(1.0, 0.0, 1.0).normalize(), n, Color::ZERO);

        assert!((on_peak - Color::ONE).length() < 1e-12);
        assert!(off_peak.x < on_peak.x);
    }

    #[test]
    fn test_material_classification() {
        assert!(Material::metal("gold", Color::new(1.0, 0.8, 0.3), 0.9).is_metal());
        assert!(!Material::glass("glass", 1.5).is_metal());
        assert!(Material::emissive("lamp", Color::ONE, 5.0).is_emissive());
        assert!(!Material::default().is_emissive());
        assert_eq!(
            Material::emissive("lamp", Color::new(1.0, 0.5, 0.0), 2.0).emission(),
            Color::new(2.0, 1.0, 0.0)
        );
        // Strength without color emits nothing.
        let black = Material {
            emission_strength: 10.0,
            ..Material::default()
        };
        assert!(!black.is_emissive());
    }

    #[test]
    fn test_texture_names_carry_color_space() {
        let material = Material::default()
            .with_texture("wood.png")
            .with_bump_map("wood_h.png", 0.5);
        let names: Vec<(&str, ColorSpace)> = material.texture_names().collect();

        assert_eq!(names, vec![("wood.png", ColorSpace::Srgb), ("wood_h.png", ColorSpace::Linear)]);
        assert_eq!(Material::default().texture_names().count(), 0);
        assert_eq!(material.bump_strength, 0.5);
    }
}
