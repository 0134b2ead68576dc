//! Recursive light transport.
//!
//! Whitted-style tracing with stochastic extras: stratified soft shadows from
//! area lights, glossy reflection lobes and Fresnel-weighted refraction.
//! Randomness comes from the caller's generator so each worker owns its stream.

use prism_core::{Light, LightKind, Scene, SceneSettings, Shape, TextureSource};
use prism_math::{Color, DVec3, Interval, Ray};
use rand::RngCore;

use crate::bvh::Bvh;
use crate::config::RenderConfig;
use crate::hittable::{closest_hit_brute_force, HitRecord};
use crate::sampling::{cosine_power_direction, gen_f64, stratified_side, stratified_square};

/// Closest accepted hit distance for every traced ray.
const HIT_T_MIN: f64 = 1e-5;

/// Shadow rays below this transmittance count as fully blocked.
const OPAQUE_TRANSMITTANCE: f64 = 0.01;

/// Transparent surfaces a shadow ray may pass before it gives up.
const MAX_SHADOW_STEPS: usize = 64;

/// Glossiness at or above which reflections are treated as a perfect mirror.
const MIRROR_GLOSSINESS: f64 = 0.94;

/// Depth below which glossy reflections fan out into several rays.
const GLOSSY_MAX_DEPTH: u32 = 2;

const BUMP_DELTA: f64 = 0.001;
const BUMP_SCALE: f64 = 10.0;

/// Read-only view of everything a ray can interact with.
pub struct Integrator<'a> {
    shapes: &'a [Shape],
    lights: &'a [Light],
    settings: &'a SceneSettings,
    bvh: &'a Bvh,
    textures: &'a dyn TextureSource,
    config: &'a RenderConfig,
}

impl<'a> Integrator<'a> {
    /// `bvh` must have been built over `scene.shapes`.
    pub fn new(
        scene: &'a Scene,
        bvh: &'a Bvh,
        textures: &'a dyn TextureSource,
        config: &'a RenderConfig,
    ) -> Self {
        Self {
            shapes: &scene.shapes,
            lights: &scene.lights,
            settings: &scene.settings,
            bvh,
            textures,
            config,
        }
    }

    /// Nearest surface along `ray` within `ray_t`.
    pub fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let hit = if self.config.use_bvh {
            self.bvh.closest_hit(self.shapes, ray, ray_t)
        } else {
            closest_hit_brute_force(self.shapes, ray, ray_t)
        };
        hit.map(|(_, rec)| rec)
    }

    /// Radiance arriving along `ray`, `depth` bounces from the camera.
    pub fn trace(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        if depth >= self.config.max_depth {
            return Color::ZERO;
        }

        let Some(hit) = self.closest_hit(ray, Interval::new(HIT_T_MIN, f64::INFINITY)) else {
            return self.settings.background();
        };
        let material = hit.material;

        let pure_emitter = material.emission_strength >= self.config.pure_emission_threshold;
        if material.is_emissive() && pure_emitter {
            return material.emission();
        }

        let dir = ray.direction.normalize();
        let pure_glass = material.transparency >= self.config.pure_glass_threshold;
        let shading_normal = self.shading_normal(&hit);
        let epsilon = self.config.ray_epsilon(hit.p);

        let mut color = if pure_glass {
            Color::ZERO
        } else {
            self.shade(&hit, shading_normal, -dir, ray.time, rng)
        };

        if material.reflectivity > 0.0 {
            let mut reflected =
                self.trace_reflection(&hit, dir, shading_normal, epsilon, ray.time, depth, rng);
            if material.is_metal() {
                reflected *= self.surface_colors(&hit).0;
            }
            color = color * (1.0 - material.reflectivity) + reflected * material.reflectivity;
        }

        if material.transparency > 0.0 {
            let n = hit.normal;
            let eta = if hit.front_face {
                1.0 / material.refractive_index
            } else {
                material.refractive_index
            };
            let cos_theta = dir.dot(n).abs();
            let fresnel = schlick(cos_theta, eta);

            let reflect_ray = Ray::new(hit.p + n * epsilon, reflect(dir, n), ray.time);
            let reflected = self.trace(&reflect_ray, depth + 1, rng);

            let kt = material.transparency;
            match refract(dir, n, cos_theta, eta) {
                Some(refracted_dir) => {
                    let refract_ray = Ray::new(hit.p - n * epsilon, refracted_dir, ray.time);
                    let refracted = self.trace(&refract_ray, depth + 1, rng);
                    let combined = reflected * fresnel + refracted * (1.0 - fresnel);
                    if pure_glass {
                        return combined + material.emission();
                    }
                    color = color * (1.0 - kt) + combined * kt;
                }
                // Total internal reflection.
                None => color = color * (1.0 - kt) + reflected * kt,
            }
        }

        color + material.emission()
    }

    /// Ambient plus direct light from every light, attenuated by shadowing.
    fn shade(
        &self,
        hit: &HitRecord<'_>,
        shading_normal: DVec3,
        view_dir: DVec3,
        time: f64,
        rng: &mut dyn RngCore,
    ) -> Color {
        let material = hit.material;
        let (albedo, ambient) = self.surface_colors(hit);
        let mut total = ambient * self.config.ambient_factor;

        for light in self.lights {
            let shadow = self.shadow_fraction(hit.p, hit.normal, light, time, rng);
            if shadow >= 1.0 {
                continue;
            }

            let to_light = light.position - hit.p;
            let dist = to_light.length();
            if dist == 0.0 {
                continue;
            }
            let light_dir = to_light / dist;

            let n_dot_l = shading_normal.dot(light_dir).max(0.0);
            if n_dot_l > 0.0 {
                let incoming =
                    light.radiance_at(dist) * self.config.light_intensity_factor * (1.0 - shadow);
                let brdf = material.eval(view_dir, light_dir, shading_normal, albedo);
                total += brdf * incoming * n_dot_l;
            }
        }

        total
    }

    /// Fraction of `light` hidden from `p`, in [0, 1].
    ///
    /// Area lights are sampled on a jittered square grid. Each sample marches
    /// toward the light through transparent surfaces, multiplying in their
    /// transparency; any opaque surface blocks it completely.
    pub fn shadow_fraction(
        &self,
        p: DVec3,
        normal: DVec3,
        light: &Light,
        time: f64,
        rng: &mut dyn RngCore,
    ) -> f64 {
        if !self.config.enable_shadows {
            return 0.0;
        }

        let requested = match light.kind {
            LightKind::Point => 1,
            LightKind::Area { .. } if self.config.shadow_samples > 0 => self.config.shadow_samples,
            LightKind::Area { .. } => light.sample_count(),
        };

        let epsilon = self.config.ray_epsilon(p);
        let origin = p + normal * epsilon;
        let samples = stratified_square(rng, stratified_side(requested));

        let blocked: f64 = samples
            .iter()
            .map(|uv| {
                let target = light.sample_point(uv.x, uv.y);
                1.0 - self.transmittance(origin, target, epsilon, time)
            })
            .sum();
        blocked / samples.len() as f64
    }

    /// Share of light passing from `origin` to `target`.
    fn transmittance(&self, origin: DVec3, target: DVec3, epsilon: f64, time: f64) -> f64 {
        let offset = target - origin;
        let dist = offset.length();
        if dist == 0.0 {
            return 1.0;
        }
        let dir = offset / dist;

        let mut attenuation = 1.0;
        let mut travelled = 0.0;
        for _ in 0..MAX_SHADOW_STEPS {
            let remaining = dist - travelled;
            if remaining <= epsilon {
                return attenuation;
            }
            let ray = Ray::new(origin + dir * travelled, dir, time);
            let Some(hit) = self.closest_hit(&ray, Interval::new(epsilon, remaining)) else {
                return attenuation;
            };

            let transparency = hit.material.transparency;
            if transparency <= 0.0 {
                return 0.0;
            }
            attenuation *= transparency;
            if attenuation < OPAQUE_TRANSMITTANCE {
                return 0.0;
            }
            travelled += hit.t + epsilon;
        }
        attenuation
    }

    /// Mirror or glossy reflection leaving `hit`.
    #[allow(clippy::too_many_arguments)]
    fn trace_reflection(
        &self,
        hit: &HitRecord<'_>,
        dir: DVec3,
        shading_normal: DVec3,
        epsilon: f64,
        time: f64,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let mirror = reflect(dir, shading_normal);
        let origin = hit.p + hit.normal * epsilon;
        let glossiness = hit.material.glossiness;

        let samples = self.config.glossy_samples;
        if samples <= 1 || glossiness >= MIRROR_GLOSSINESS || depth >= GLOSSY_MAX_DEPTH {
            return self.trace(&Ray::new(origin, mirror, time), depth + 1, rng);
        }

        let exponent = 10f64.powf(4.0 * glossiness);
        let mut sum = Color::ZERO;
        for _ in 0..samples {
            let (r1, r2) = (gen_f64(rng), gen_f64(rng));
            let mut sample_dir = cosine_power_direction(mirror, exponent, r1, r2);
            if sample_dir.dot(hit.normal) < 0.0 {
                sample_dir = mirror;
            }
            sum += self.trace(&Ray::new(origin, sample_dir, time), depth + 1, rng);
        }
        sum / samples as f64
    }

    /// Diffuse and ambient colors, modulated by the material's texture if loaded.
    fn surface_colors(&self, hit: &HitRecord<'_>) -> (Color, Color) {
        let material = hit.material;
        let texel = self
            .loaded(&material.texture, self.config.enable_textures)
            .map(|name| self.textures.sample(name, hit.u, hit.v));

        match texel {
            Some(tex) => (tex * material.diffuse_color, tex * material.ambient_color),
            None => (material.diffuse_color, material.ambient_color),
        }
    }

    /// Normal used for lighting: the geometric normal perturbed by a normal
    /// map, or failing that a bump map.
    fn shading_normal(&self, hit: &HitRecord<'_>) -> DVec3 {
        let material = hit.material;

        if let Some(name) = self.loaded(&material.normal_map, self.config.enable_normal_maps) {
            let sample = self.textures.sample(name, hit.u, hit.v) * 2.0 - Color::ONE;
            let local = DVec3::new(
                sample.x * material.bump_strength,
                sample.y * material.bump_strength,
                sample.z,
            )
            .normalize_or_zero();
            let perturbed = hit.tangent * local.x + hit.bitangent * local.y + hit.normal * local.z;
            return perturbed.try_normalize().unwrap_or(hit.normal);
        }

        if let Some(name) = self.loaded(&material.bump_map, self.config.enable_bump_maps) {
            let height = |u: f64, v: f64| luminance(self.textures.sample(name, u, v));
            let center = height(hit.u, hit.v);
            let du = (height(hit.u + BUMP_DELTA, hit.v) - center) / BUMP_DELTA;
            let dv = (height(hit.u, hit.v + BUMP_DELTA) - center) / BUMP_DELTA;
            let scale = BUMP_SCALE * material.bump_strength;
            let perturbed = hit.normal - hit.tangent * (du * scale) - hit.bitangent * (dv * scale);
            return perturbed.try_normalize().unwrap_or(hit.normal);
        }

        hit.normal
    }

    /// `name` if the feature is enabled and the texture is loaded.
    fn loaded<'m>(&self, name: &'m Option<String>, enabled: bool) -> Option<&'m str> {
        name.as_deref().filter(|name| enabled && self.textures.has(name))
    }
}

#[inline]
fn reflect(dir: DVec3, n: DVec3) -> DVec3 {
    dir - n * 2.0 * dir.dot(n)
}

/// Snell refraction of a unit `dir` through unit `n`, which faces against it.
///
/// `None` on total internal reflection.
fn refract(dir: DVec3, n: DVec3, cos_theta: f64, eta: f64) -> Option<DVec3> {
    let perp = (dir + n * cos_theta) * eta;
    let disc = 1.0 - perp.length_squared();
    if disc < 0.0 {
        return None;
    }
    Some(perp - n * disc.sqrt())
}

/// Schlick's approximation of Fresnel reflectance.
fn schlick(cosine: f64, eta: f64) -> f64 {
    let r0 = ((eta - 1.0) / (eta + 1.0)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[inline]
fn luminance(c: Color) -> f64 {
    0.299 * c.x + 0.587 * c.y + 0.114 * c.z
}
