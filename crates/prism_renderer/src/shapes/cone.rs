//! Capped cone around the object z axis: base disk of `radius` at `z = -depth/2`
//! narrowing to the tip at `z = +depth/2`.

use prism_math::{DVec3, Interval, Ray};

use super::cylinder::{disk_cap, side_hit};
use super::{solve_quadratic, LocalHit};

pub(crate) fn intersect(radius: f64, depth: f64, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    if radius <= 0.0 || depth <= 0.0 {
        return None;
    }
    let half = depth * 0.5;
    let k2 = (radius / depth).powi(2);
    let (o, d) = (ray.origin, ray.direction);

    // x^2 + y^2 = k^2 (tip - z)^2
    let w = half - o.z;
    let a = d.x * d.x + d.y * d.y - k2 * d.z * d.z;
    let half_b = o.x * d.x + o.y * d.y + k2 * w * d.z;
    let c = o.x * o.x + o.y * o.y - k2 * w * w;

    let roots = if a == 0.0 {
        // Parallel to a generator line: one crossing at most.
        (half_b != 0.0).then(|| -c / (2.0 * half_b)).map(|t| (t, t))
    } else {
        solve_quadratic(a, half_b, c)
    };

    let mut best: Option<LocalHit> = None;
    let mut closest = ray_t.max;

    if let Some((t0, t1)) = roots {
        for t in [t0, t1] {
            if !Interval::new(ray_t.min, closest).surrounds(t) {
                continue;
            }
            let point = ray.at(t);
            if point.z < -half || point.z > half {
                continue;
            }
            let normal = if point.x * point.x + point.y * point.y < 1e-24 {
                DVec3::Z
            } else {
                DVec3::new(point.x, point.y, k2 * (half - point.z))
            };
            closest = t;
            best = Some(side_hit(t, point, normal, half, depth));
        }
    }

    if let Some(hit) = disk_cap(-half, radius, ray, Interval::new(ray_t.min, closest)) {
        best = Some(hit);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward() -> Interval {
        Interval::new(1e-5, f64::INFINITY)
    }

    #[test]
    fn test_side_radius_shrinks_toward_tip() {
        // Radius 1 at z = -1, 0.5 at z = 0.
        let ray = Ray::new(DVec3::new(-5.0, 0.0, 0.0), DVec3::X, 0.0);
        let hit = intersect(1.0, 2.0, &ray, forward()).expect("hit");

        assert!((hit.t - 4.5).abs() < 1e-12);
        let n = hit.normal.normalize();
        assert!(n.x < 0.0 && n.z > 0.0);
        // Normal is perpendicular to the generator line through the hit.
        let generator = DVec3::new(0.0, 0.0, 1.0) - hit.point;
        assert!(n.dot(generator).abs() < 1e-12);
    }

    #[test]
    fn test_tip_hit_has_axis_normal() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z, 0.0);
        let hit = intersect(1.0, 2.0, &ray, forward()).expect("tip");
        assert!((hit.t - 4.0).abs() < 1e-9);
        assert_eq!(hit.normal, DVec3::Z);
    }

    #[test]
    fn test_base_cap() {
        let ray = Ray::new(DVec3::new(0.3, 0.0, -5.0), DVec3::Z, 0.0);
        let hit = intersect(1.0, 2.0, &ray, forward()).expect("base");
        assert!((hit.t - 4.0).abs() < 1e-12);
        assert_eq!(hit.normal, DVec3::NEG_Z);
    }

    #[test]
    fn test_mirror_nappe_is_ignored() {
        // The implicit double cone continues above the tip; the shape does not.
        let ray = Ray::new(DVec3::new(-5.0, 0.0, 1.5), DVec3::X, 0.0);
        assert!(intersect(1.0, 2.0, &ray, forward()).is_none());
    }

    #[test]
    fn test_ray_parallel_to_generator() {
        // Parallel to the generator on the -x side, so it crosses the +x side once.
        let ray = Ray::new(DVec3::new(1.0, 0.0, 1.0), DVec3::new(-0.5, 0.0, -1.0), 0.0);
        let hit = intersect(1.0, 2.0, &ray, forward()).expect("single crossing");
        assert!((hit.t - 1.0).abs() < 1e-12);
        assert!((hit.point - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
    }
}
