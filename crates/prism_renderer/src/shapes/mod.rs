//! Ray intersection for scene shapes.
//!
//! Every shape is intersected in object space against its canonical form. The
//! world ray is carried into object space by the shape's transform at the ray's
//! time, the per-kind routine solves for the nearest hit, and [`to_world`]
//! brings the result back.

mod cone;
mod cube;
mod cylinder;
mod polygon;
mod sphere;
mod torus;

pub use torus::solve_quartic;

use prism_core::{Shape, ShapeKind};
use prism_math::{Aabb, DVec3, Interval, Ray, Transform};

use crate::hittable::{HitRecord, Hittable};

/// Time samples used to bound a moving shape over the shutter interval.
const MOTION_BOUND_STEPS: usize = 8;

/// Intersection expressed in the shape's object space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalHit {
    /// Parameter along the object-space ray
    pub t: f64,
    pub point: DVec3,
    /// Outward normal, not necessarily unit length
    pub normal: DVec3,
    pub u: f64,
    pub v: f64,
    /// Direction of increasing u
    pub tangent: DVec3,
}

impl Hittable for Shape {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        if !self.visible {
            return None;
        }

        let transform = self.transform_at(ray.time);
        let local_ray = transform.ray_to_object(ray);

        let local = match &self.kind {
            ShapeKind::Sphere => sphere::intersect(&local_ray, ray_t),
            ShapeKind::Cube => cube::intersect(&local_ray, ray_t, transform.scale()),
            ShapeKind::Polygon { points } => polygon::intersect(points, &local_ray, ray_t),
            ShapeKind::Torus {
                major_radius,
                minor_radius,
            } => torus::intersect(*major_radius, *minor_radius, &local_ray, ray_t),
            ShapeKind::Cylinder { radius, depth } => {
                cylinder::intersect(*radius, *depth, &local_ray, ray_t)
            }
            ShapeKind::Cone { radius, depth } => {
                cone::intersect(*radius, *depth, &local_ray, ray_t)
            }
        }?;

        Some(to_world(self, &transform, ray, &local))
    }

    fn bounding_box(&self) -> Aabb {
        let local = object_bounds(&self.kind);
        match &self.motion {
            None => self.transform.aabb_to_world(&local),
            Some(motion) => (0..=MOTION_BOUND_STEPS)
                .map(|i| {
                    let time = i as f64 / MOTION_BOUND_STEPS as f64;
                    Transform::from_matrix(motion.matrix_at(time)).aabb_to_world(&local)
                })
                .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b)),
        }
    }
}

/// Object-space bounds of the canonical shape.
pub(crate) fn object_bounds(kind: &ShapeKind) -> Aabb {
    match kind {
        ShapeKind::Sphere | ShapeKind::Cube => {
            Aabb::from_points(DVec3::splat(-1.0), DVec3::splat(1.0))
        }
        ShapeKind::Polygon { points } if points.len() >= 3 => {
            Aabb::enclosing(points.iter().copied())
        }
        ShapeKind::Polygon { .. } => Aabb::EMPTY,
        ShapeKind::Torus {
            major_radius,
            minor_radius,
        } => {
            let reach = major_radius + minor_radius;
            Aabb::from_points(
                DVec3::new(-reach, -reach, -minor_radius),
                DVec3::new(reach, reach, *minor_radius),
            )
        }
        ShapeKind::Cylinder { radius, depth } | ShapeKind::Cone { radius, depth } => {
            let half = depth * 0.5;
            Aabb::from_points(
                DVec3::new(-radius, -radius, -half),
                DVec3::new(*radius, *radius, half),
            )
        }
    }
}

/// Build the world-space hit record.
///
/// The distance is recomputed from the world-space point, since object-space
/// parameters don't survive non-uniform scale once routines normalize directions.
fn to_world<'a>(
    shape: &'a Shape,
    transform: &Transform,
    ray: &Ray,
    local: &LocalHit,
) -> HitRecord<'a> {
    let p = transform.point_to_world(local.point);
    let t = (p - ray.origin).length() / ray.direction.length();

    let mut rec = HitRecord {
        p,
        normal: DVec3::ZERO,
        tangent: DVec3::ZERO,
        bitangent: DVec3::ZERO,
        material: &shape.material,
        u: local.u,
        v: local.v,
        t,
        front_face: false,
    };
    rec.set_face_normal(ray, transform.normal_to_world(local.normal));
    rec.set_tangent_frame(transform.direction_to_world(local.tangent));
    rec
}

/// Smaller root of a quadratic first, using the cancellation-free form.
///
/// `half_b` is half the linear coefficient. Returns `None` for a negative
/// discriminant or `a == 0`.
pub(crate) fn solve_quadratic(a: f64, half_b: f64, c: f64) -> Option<(f64, f64)> {
    if a == 0.0 {
        return None;
    }
    let discriminant = half_b.mul_add(half_b, -a * c);
    if discriminant < 0.0 {
        return None;
    }
    let q = -(half_b + discriminant.sqrt().copysign(half_b));
    if q == 0.0 {
        // b == 0 and c == 0: double root at zero.
        return Some((0.0, 0.0));
    }
    let (r0, r1) = (q / a, c / q);
    Some(if r0 <= r1 { (r0, r1) } else { (r1, r0) })
}
