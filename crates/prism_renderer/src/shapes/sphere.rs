//! Unit sphere at the origin.

use std::f64::consts::{PI, TAU};

use prism_math::{DVec3, Interval, Ray};

use super::{solve_quadratic, LocalHit};

pub(crate) fn intersect(ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    let a = ray.direction.length_squared();
    let half_b = ray.origin.dot(ray.direction);
    let c = ray.origin.length_squared() - 1.0;

    let (near, far) = solve_quadratic(a, half_b, c)?;
    let t = if ray_t.surrounds(near) {
        near
    } else if ray_t.surrounds(far) {
        far
    } else {
        return None;
    };

    // Re-project onto the surface; the normal is the position itself.
    let point = ray.at(t).normalize();
    let (u, v) = sphere_uv(point);

    Some(LocalHit {
        t,
        point,
        normal: point,
        u,
        v,
        tangent: sphere_tangent(point),
    })
}

/// Z-up spherical mapping: u around the z axis, v = 1 at the +z pole.
fn sphere_uv(p: DVec3) -> (f64, f64) {
    let theta = p.z.clamp(-1.0, 1.0).acos();
    let phi = p.y.atan2(p.x);
    ((phi + PI) / TAU, 1.0 - theta / PI)
}

/// dp/dphi, with a fixed direction at the poles.
fn sphere_tangent(p: DVec3) -> DVec3 {
    let tangent = DVec3::new(-p.y, p.x, 0.0);
    if tangent.length_squared() < 1e-6 {
        DVec3::X
    } else {
        tangent
    }
}
