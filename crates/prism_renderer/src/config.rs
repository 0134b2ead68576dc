//! Render configuration and per-pixel post-processing.

use prism_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by [`RenderConfig::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("aa_samples must be at least 1")]
    NoSamples,

    #[error("max_depth must be at least 1")]
    NoDepth,

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
}

/// Curve applied to averaged pixel radiance before gamma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMapping {
    #[default]
    None,
    /// `c / (1 + c)`
    Reinhard,
    /// `clamp(c * exposure, 0, 1)`
    Exposure,
}

/// Render configuration.
///
/// Read-only once the renderer is built. Missing fields deserialize to their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Camera rays per pixel
    pub aa_samples: u32,
    /// Shadow rays per area light; 0 defers to each light's own count
    pub shadow_samples: u32,
    /// Rays per glossy reflection; values of 1 or less trace the mirror direction only
    pub glossy_samples: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,

    pub tone_mapping: ToneMapping,
    pub exposure: f64,
    pub gamma: f64,
    pub enable_gamma_correction: bool,

    /// Global multiplier on light intensity
    pub light_intensity_factor: f64,
    /// Global multiplier on material ambient color
    pub ambient_factor: f64,

    /// Fixed offset of secondary ray origins along the normal
    pub ray_offset_epsilon: f64,
    /// Grow the offset with distance from the world origin
    pub use_adaptive_epsilon: bool,
    pub adaptive_epsilon_scale: f64,

    /// Transparency at or above which local shading is skipped
    pub pure_glass_threshold: f64,
    /// Emission strength at or above which a surface returns only its emission
    pub pure_emission_threshold: f64,

    pub enable_shadows: bool,
    pub enable_textures: bool,
    pub enable_normal_maps: bool,
    pub enable_bump_maps: bool,
    pub enable_motion_blur: bool,

    /// Use the BVH; false falls back to testing every shape
    pub use_bvh: bool,
    /// Worker threads; 0 uses the global rayon pool
    pub threads: usize,
    /// Base seed for the per-row random generators
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            aa_samples: 4,
            shadow_samples: 16,
            glossy_samples: 0,
            max_depth: 12,
            tone_mapping: ToneMapping::None,
            exposure: 1.0,
            gamma: 2.2,
            enable_gamma_correction: true,
            light_intensity_factor: 0.2,
            ambient_factor: 1.0,
            ray_offset_epsilon: 0.001,
            use_adaptive_epsilon: true,
            adaptive_epsilon_scale: 0.0001,
            pure_glass_threshold: 0.99,
            pure_emission_threshold: 4.0,
            enable_shadows: true,
            enable_textures: true,
            enable_normal_maps: true,
            enable_bump_maps: true,
            enable_motion_blur: true,
            use_bvh: true,
            threads: 0,
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aa_samples == 0 {
            return Err(ConfigError::NoSamples);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::NoDepth);
        }
        positive("gamma", self.gamma)?;
        positive("exposure", self.exposure)?;
        non_negative("light_intensity_factor", self.light_intensity_factor)?;
        non_negative("ambient_factor", self.ambient_factor)?;
        non_negative("ray_offset_epsilon", self.ray_offset_epsilon)?;
        non_negative("adaptive_epsilon_scale", self.adaptive_epsilon_scale)?;
        non_negative("pure_emission_threshold", self.pure_emission_threshold)?;
        unit_range("pure_glass_threshold", self.pure_glass_threshold)?;
        Ok(())
    }

    /// Offset for secondary rays leaving `p`.
    pub fn ray_epsilon(&self, p: prism_math::DVec3) -> f64 {
        if self.use_adaptive_epsilon {
            self.ray_offset_epsilon + p.length() * self.adaptive_epsilon_scale
        } else {
            self.ray_offset_epsilon
        }
    }

    /// Tone map then gamma-correct an averaged pixel value.
    pub fn post_process(&self, color: Color) -> Color {
        let mapped = match self.tone_mapping {
            ToneMapping::None => color,
            ToneMapping::Reinhard => color / (Color::ONE + color),
            ToneMapping::Exposure => (color * self.exposure).clamp(Color::ZERO, Color::ONE),
        };

        if self.enable_gamma_correction {
            let inv = 1.0 / self.gamma;
            Color::new(gamma(mapped.x, inv), gamma(mapped.y, inv), gamma(mapped.z, inv))
        } else {
            mapped
        }
    }
}

#[inline]
fn gamma(channel: f64, inv_gamma: f64) -> f64 {
    if channel > 0.0 {
        channel.powf(inv_gamma)
    } else {
        0.0
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_math::DVec3;

    #[test]
    fn test_defaults_are_valid() {
        let config = RenderConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.aa_samples, 4);
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.tone_mapping, ToneMapping::None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "aa_samples": 16, "tone_mapping": "reinhard", "seed": 7 }"#;
        let config: RenderConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.aa_samples, 16);
        assert_eq!(config.tone_mapping, ToneMapping::Reinhard);
        assert_eq!(config.seed, 7);
        assert_eq!(config.shadow_samples, 16);
        assert!((config.gamma - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let config = RenderConfig {
            tone_mapping: ToneMapping::Exposure,
            threads: 3,
            ..RenderConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains(r#""tone_mapping":"exposure""#));
        let back: RenderConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_samples = RenderConfig {
            aa_samples: 0,
            ..RenderConfig::default()
        };
        assert_eq!(zero_samples.validate(), Err(ConfigError::NoSamples));

        let bad_gamma = RenderConfig {
            gamma: 0.0,
            ..RenderConfig::default()
        };
        assert!(matches!(
            bad_gamma.validate(),
            Err(ConfigError::NotPositive { name: "gamma", .. })
        ));

        let bad_eps = RenderConfig {
            ray_offset_epsilon: -1e-3,
            ..RenderConfig::default()
        };
        assert!(matches!(bad_eps.validate(), Err(ConfigError::Negative { .. })));

        let bad_glass = RenderConfig {
            pure_glass_threshold: 1.5,
            ..RenderConfig::default()
        };
        assert!(matches!(bad_glass.validate(), Err(ConfigError::OutOfUnitRange { .. })));
    }

    #[test]
    fn test_post_process_curves() {
        let linear = RenderConfig {
            enable_gamma_correction: false,
            ..RenderConfig::default()
        };
        assert_eq!(linear.post_process(Color::splat(3.0)), Color::splat(3.0));

        let reinhard = RenderConfig {
            tone_mapping: ToneMapping::Reinhard,
            ..linear.clone()
        };
        assert!((reinhard.post_process(Color::splat(1.0)) - Color::splat(0.5)).length() < 1e-12);

        let exposure = RenderConfig {
            tone_mapping: ToneMapping::Exposure,
            exposure: 2.0,
            ..linear
        };
        let out = exposure.post_process(Color::new(0.25, 0.75, -1.0));
        assert!((out - Color::new(0.5, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_gamma_correction() {
        let config = RenderConfig {
            gamma: 2.0,
            ..RenderConfig::default()
        };
        let out = config.post_process(Color::new(0.25, 0.0, -0.5));
        assert!((out - Color::new(0.5, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_adaptive_epsilon() {
        let config = RenderConfig::default();
        let far = DVec3::new(1000.0, 0.0, 0.0);
        assert!((config.ray_epsilon(far) - (0.001 + 0.1)).abs() < 1e-12);

        let fixed = RenderConfig {
            use_adaptive_epsilon: false,
            ..config
        };
        assert_eq!(fixed.ray_epsilon(far), 0.001);
    }
}
