//! Torus around the object z axis: a tube of radius `minor` swept along a circle
//! of radius `major` in the xy plane.
//!
//! The ray/torus equation is a quartic in t. It is solved in closed form
//! (Ferrari) in a frame with a unit direction and an origin moved up to the
//! bounding sphere, then each root is polished with Newton steps on the implicit
//! surface. The closed form alone loses several digits near silhouettes.
//!
//! Plain f64 is enough: with the origin shift the coefficients stay on the
//! scale of the torus, and the Newton polish recovers what Ferrari loses, so
//! hit distances stay within about 1e-10 even for rays 1e-11 from tangent.

use std::f64::consts::PI;

use prism_math::{DVec3, Interval, Ray};

use super::{solve_quadratic, LocalHit};

/// Discriminants down to this are treated as a tangent double root.
const ROOT_EPSILON: f64 = 1e-10;

const NEWTON_ITERATIONS: usize = 5;

pub(crate) fn intersect(major: f64, minor: f64, ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    if major <= 0.0 || minor <= 0.0 {
        return None;
    }
    let dir_length = ray.direction.length();
    if dir_length == 0.0 {
        return None;
    }
    let d = ray.direction / dir_length;
    let o = ray.origin;

    let reach = major + minor;
    let b = o.dot(d);
    let c = o.length_squared() - reach * reach;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let sphere_disc = b * b - c;
    if sphere_disc < 0.0 {
        return None;
    }

    // Restart the ray at the bounding sphere so the coefficients stay small.
    let shift = (-b - sphere_disc.sqrt()).max(0.0);
    let near = o + d * shift;

    let (r2, big_r2) = (minor * minor, major * major);
    let beta = 2.0 * near.dot(d);
    let gamma = near.length_squared() - r2 - big_r2;
    let four_r2 = 4.0 * big_r2;

    let roots = solve_quartic(
        1.0,
        2.0 * beta,
        beta * beta + 2.0 * gamma + four_r2 * d.z * d.z,
        2.0 * beta * gamma + 2.0 * four_r2 * near.z * d.z,
        gamma * gamma + four_r2 * (near.z * near.z - r2),
    );

    let range = Interval::new(ray_t.min * dir_length, ray_t.max * dir_length);
    let t = roots
        .into_iter()
        .map(|root| polish(o, d, root + shift, major, minor))
        .filter(|&t| range.surrounds(t))
        .min_by(f64::total_cmp)?;

    let point = o + d * t;
    let rho = (point.x * point.x + point.y * point.y).sqrt();
    let radial = (rho - major) / rho.max(1e-10);
    let normal = DVec3::new(point.x * radial, point.y * radial, point.z);

    let phi = point.y.atan2(point.x);
    let theta = point.z.atan2(rho - major);
    let tangent = DVec3::new(-point.y, point.x, 0.0);

    Some(LocalHit {
        t: t / dir_length,
        point,
        normal,
        u: (phi + PI) / (2.0 * PI),
        v: (theta + PI) / (2.0 * PI),
        tangent: if tangent.length_squared() < 1e-12 { DVec3::X } else { tangent },
    })
}

/// Newton steps on `(|p|^2 + R^2 - r^2)^2 - 4R^2(x^2 + y^2)` along a unit direction.
fn polish(origin: DVec3, dir: DVec3, t: f64, major: f64, minor: f64) -> f64 {
    let big_r2 = major * major;
    let offset = big_r2 - minor * minor;
    let mut t = t;
    for _ in 0..NEWTON_ITERATIONS {
        let p = origin + dir * t;
        let term = p.length_squared() + offset;
        let value = term * term - 4.0 * big_r2 * (p.x * p.x + p.y * p.y);
        if value == 0.0 {
            break;
        }

        let radial = 4.0 * term - 8.0 * big_r2;
        let gradient = DVec3::new(radial * p.x, radial * p.y, 4.0 * term * p.z);
        let slope = gradient.dot(dir);
        if slope.abs() < 1e-12 {
            break;
        }
        let step = value / slope;
        t -= step;
        if step.abs() < 1e-14 * (1.0 + t.abs()) {
            break;
        }
    }
    t
}

/// Real roots of `a x^4 + b x^3 + c x^2 + d x + e`, sorted ascending.
///
/// Falls back to the cubic or quadratic when the leading coefficients vanish.
/// Double roots may be reported once or twice.
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    if a == 0.0 {
        return solve_cubic(b, c, d, e);
    }
    let (b, c, d, e) = (b / a, c / a, d / a, e / a);

    // Depressed form y^4 + p y^2 + q y + r with x = y - b/4.
    let b2 = b * b;
    let p = c - 0.375 * b2;
    let q = 0.125 * b2 * b - 0.5 * b * c + d;
    let r = -0.01171875 * b2 * b2 + 0.0625 * b2 * c - 0.25 * b * d + e;
    let shift = -0.25 * b;

    let mut roots = Vec::with_capacity(4);
    if q.abs() < ROOT_EPSILON {
        for y2 in monic_quadratic(p, r) {
            if y2 >= 0.0 {
                let y = y2.sqrt();
                roots.push(y + shift);
                roots.push(-y + shift);
            }
        }
    } else {
        // Resolvent z^3 + 2p z^2 + (p^2 - 4r) z - q^2; its largest root is positive.
        let z = solve_cubic(1.0, 2.0 * p, p * p - 4.0 * r, -q * q)
            .into_iter()
            .fold(0.0_f64, f64::max);
        let s = z.sqrt();
        if s > 0.0 {
            let half_q = q / s;
            for y in monic_quadratic(-s, 0.5 * (p + z + half_q)) {
                roots.push(y + shift);
            }
            for y in monic_quadratic(s, 0.5 * (p + z - half_q)) {
                roots.push(y + shift);
            }
        }
    }

    roots.sort_by(f64::total_cmp);
    roots
}

/// Real roots of `a x^3 + b x^2 + c x + d`, sorted ascending.
fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a == 0.0 {
        return match solve_quadratic(b, 0.5 * c, d) {
            Some((r0, r1)) => vec![r0, r1],
            None if b == 0.0 && c != 0.0 => vec![-d / c],
            None => Vec::new(),
        };
    }
    let (a, b, c) = (b / a, c / a, d / a);

    // Depressed w^3 + p w + q with x = w - a/3.
    let shift = -a / 3.0;
    let p = b - a * a / 3.0;
    let q = a * (2.0 * a * a - 9.0 * b) / 27.0 + c;
    let disc = 0.25 * q * q + p * p * p / 27.0;

    let mut roots = if p.abs() < ROOT_EPSILON && q.abs() < ROOT_EPSILON {
        vec![0.0]
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        vec![(-0.5 * q + sq).cbrt() + (-0.5 * q - sq).cbrt()]
    } else {
        let m = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (p * m)).clamp(-1.0, 1.0);
        let phi = arg.acos() / 3.0;
        (0..3)
            .map(|k| m * (phi - 2.0 * PI * k as f64 / 3.0).cos())
            .collect()
    };

    for root in roots.iter_mut() {
        *root += shift;
    }
    roots.sort_by(f64::total_cmp);
    roots
}

/// Roots of `x^2 + b x + c`, tolerating slightly negative discriminants.
fn monic_quadratic(b: f64, c: f64) -> Vec<f64> {
    let disc = b.mul_add(b, -4.0 * c);
    if disc < -ROOT_EPSILON {
        return Vec::new();
    }
    let disc = disc.max(0.0);
    if disc == 0.0 {
        return vec![-0.5 * b];
    }
    let q = -0.5 * (b + disc.sqrt().copysign(b));
    if q == 0.0 {
        return vec![0.0];
    }
    vec![q, c / q]
}
