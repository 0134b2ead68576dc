//! Capped cylinder around the object z axis, centered on the origin.

use std::f64::consts::PI;

use prism_math::{DVec3, Interval, Ray};

use super::{solve_quadratic, LocalHit};

pub(crate) fn intersect(radius: f64, depth: f64, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    if radius <= 0.0 || depth <= 0.0 {
        return None;
    }
    let half = depth * 0.5;
    let (o, d) = (ray.origin, ray.direction);

    let a = d.x * d.x + d.y * d.y;
    let half_b = o.x * d.x + o.y * d.y;
    let c = o.x * o.x + o.y * o.y - radius * radius;

    let mut best: Option<LocalHit> = None;
    let mut closest = ray_t.max;

    if let Some((t0, t1)) = solve_quadratic(a, half_b, c) {
        for t in [t0, t1] {
            if !Interval::new(ray_t.min, closest).surrounds(t) {
                continue;
            }
            let point = ray.at(t);
            if point.z < -half || point.z > half {
                continue;
            }
            closest = t;
            best = Some(side_hit(t, point, DVec3::new(point.x, point.y, 0.0), half, depth));
        }
    }

    for cap in [half, -half] {
        if let Some(hit) = disk_cap(cap, radius, ray, Interval::new(ray_t.min, closest)) {
            closest = hit.t;
            best = Some(hit);
        }
    }

    best
}

/// Hit on a lateral surface whose u wraps around z and v runs bottom to top.
pub(super) fn side_hit(t: f64, point: DVec3, normal: DVec3, half: f64, depth: f64) -> LocalHit {
    let tangent = DVec3::new(-point.y, point.x, 0.0);
    LocalHit {
        t,
        point,
        normal,
        u: (point.y.atan2(point.x) + PI) / (2.0 * PI),
        v: (point.z + half) / depth,
        tangent: if tangent.length_squared() < 1e-12 { DVec3::X } else { tangent },
    }
}

/// Disk of `radius` in the plane `z = height`, facing away from the origin.
pub(super) fn disk_cap(height: f64, radius: f64, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    if ray.direction.z == 0.0 {
        return None;
    }
    let t = (height - ray.origin.z) / ray.direction.z;
    if !ray_t.surrounds(t) {
        return None;
    }
    let point = ray.at(t);
    if point.x * point.x + point.y * point.y > radius * radius {
        return None;
    }
    Some(LocalHit {
        t,
        point: DVec3::new(point.x, point.y, height),
        normal: DVec3::new(0.0, 0.0, height.signum()),
        u: (point.x / radius + 1.0) * 0.5,
        v: (point.y / radius + 1.0) * 0.5,
        tangent: DVec3::X,
    })
}
