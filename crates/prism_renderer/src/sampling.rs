//! Random sample generation for pixels, lights and glossy lobes.

use std::f64::consts::PI;

use prism_math::{generate_onb, DVec2, DVec3};
use rand::{Rng, RngCore};

/// Uniform sample in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform point in the unit square.
#[inline]
pub fn unit_square(rng: &mut dyn RngCore) -> DVec2 {
    DVec2::new(gen_f64(rng), gen_f64(rng))
}

/// Cells per side of the largest square grid with at most `samples` cells, at least 1.
pub fn stratified_side(samples: u32) -> u32 {
    ((samples as f64).sqrt() as u32).max(1)
}

/// One jittered point per cell of a `side x side` grid over the unit square.
pub fn stratified_square(rng: &mut dyn RngCore, side: u32) -> Vec<DVec2> {
    let inv = 1.0 / side as f64;
    let mut points = Vec::with_capacity((side * side) as usize);
    for i in 0..side {
        for j in 0..side {
            let u = (i as f64 + gen_f64(rng)) * inv;
            let v = (j as f64 + gen_f64(rng)) * inv;
            points.push(DVec2::new(u, v));
        }
    }
    points
}

/// Direction distributed as `cos^exponent` around `axis`, from two uniform samples.
///
/// Larger exponents concentrate samples around `axis`.
pub fn cosine_power_direction(axis: DVec3, exponent: f64, r1: f64, r2: f64) -> DVec3 {
    let cos_theta = r1.powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * r2;

    let frame = generate_onb(axis.normalize());
    let local = DVec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    (frame * local).normalize()
}
