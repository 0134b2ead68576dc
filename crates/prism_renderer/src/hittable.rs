//! Hittable trait and HitRecord for ray-object intersection.

use prism_core::Material;
use prism_math::{Aabb, DVec3, Interval, Ray};

/// Record of a ray-object intersection.
#[derive(Clone, Debug)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: DVec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: DVec3,
    /// Unit tangent, orthogonal to `normal`
    pub tangent: DVec3,
    /// `normal x tangent`
    pub bitangent: DVec3,
    /// Material at the intersection point
    pub material: &'a Material,
    /// UV texture coordinates
    pub u: f64,
    pub v: f64,
    /// World-space ray parameter of the hit
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl<'a> HitRecord<'a> {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: DVec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// Gram-Schmidt `tangent` against the stored normal and rebuild the bitangent.
    ///
    /// Falls back to an arbitrary perpendicular when the tangent is parallel to
    /// the normal.
    pub fn set_tangent_frame(&mut self, tangent: DVec3) {
        let n = self.normal;
        let projected = tangent - n * n.dot(tangent);
        self.tangent = if projected.length_squared() > 1e-20 {
            projected.normalize()
        } else {
            n.any_orthonormal_vector()
        };
        self.bitangent = n.cross(self.tangent);
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with parameter strictly inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Representative point used to partition objects.
    fn centroid(&self) -> DVec3 {
        self.bounding_box().centroid()
    }
}

/// Nearest hit over every object, without acceleration.
pub fn closest_hit_brute_force<'a, H: Hittable>(
    objects: &'a [H],
    ray: &Ray,
    ray_t: Interval,
) -> Option<(usize, HitRecord<'a>)> {
    let mut closest: Option<(usize, HitRecord<'a>)> = None;
    let mut closest_so_far = ray_t.max;

    for (index, object) in objects.iter().enumerate() {
        if let Some(rec) = object.hit(ray, ray_t.with_max(closest_so_far)) {
            closest_so_far = rec.t;
            closest = Some((index, rec));
        }
    }

    closest
}
