// Object <-> world transforms
//
// glam already provides transform_point3/transform_vector3 on DMat4. This module adds
// the pieces a ray tracer needs on top: a pivoted general inverse, normal transforms,
// conservative box transforms and the mutually-inverse `Transform` pair.

use glam::{DMat4, DVec3};

use crate::{Aabb, Ray};

/// Pivots smaller than this are treated as singular and skipped during inversion.
const PIVOT_EPSILON: f64 = 1e-10;

/// Extension trait for DMat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// General 4x4 inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Columns whose best pivot is below 1e-10 are skipped instead of divided by,
    /// so a singular input yields a finite (if meaningless) matrix rather than NaNs.
    fn inverse_pivoted(&self) -> DMat4;

    /// Transform a normal by the inverse-transpose, given the inverse matrix.
    fn transform_normal3(&self, normal: DVec3) -> DVec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for DMat4 {
    fn inverse_pivoted(&self) -> DMat4 {
        // Row-major working copies.
        let mut a = self.transpose().to_cols_array_2d();
        let mut inv = DMat4::IDENTITY.to_cols_array_2d();

        for col in 0..4 {
            let pivot_row = (col..4)
                .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
                .unwrap_or(col);
            if a[pivot_row][col].abs() < PIVOT_EPSILON {
                continue;
            }
            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);

            let pivot = a[col][col];
            for k in 0..4 {
                a[col][k] /= pivot;
                inv[col][k] /= pivot;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }

        DMat4::from_cols_array_2d(&inv).transpose()
    }

    fn transform_normal3(&self, normal: DVec3) -> DVec3 {
        self.transpose().transform_vector3(normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return *aabb;
        }
        Aabb::enclosing(aabb.corners().map(|corner| self.transform_point3(corner)))
    }
}

/// Build `T * Rz * Ry * Rx * S` from a translation, Euler angles in radians and a
/// per-axis scale.
pub fn trs_matrix(translation: DVec3, rotation: DVec3, scale: DVec3) -> DMat4 {
    DMat4::from_translation(translation)
        * DMat4::from_rotation_z(rotation.z)
        * DMat4::from_rotation_y(rotation.y)
        * DMat4::from_rotation_x(rotation.x)
        * DMat4::from_scale(scale)
}

/// A mutually-inverse pair of object->world and world->object matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    object_to_world: DMat4,
    world_to_object: DMat4,
    /// Lengths of the object->world basis vectors
    scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        object_to_world: DMat4::IDENTITY,
        world_to_object: DMat4::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Wrap an object->world matrix, computing its inverse.
    pub fn from_matrix(object_to_world: DMat4) -> Self {
        Self {
            object_to_world,
            world_to_object: object_to_world.inverse_pivoted(),
            scale: DVec3::new(
                object_to_world.x_axis.truncate().length(),
                object_to_world.y_axis.truncate().length(),
                object_to_world.z_axis.truncate().length(),
            ),
        }
    }

    pub fn from_trs(translation: DVec3, rotation: DVec3, scale: DVec3) -> Self {
        Self::from_matrix(trs_matrix(translation, rotation, scale))
    }

    /// TRS with the same scale on every axis.
    pub fn from_trs_uniform(translation: DVec3, rotation: DVec3, scale: f64) -> Self {
        Self::from_trs(translation, rotation, DVec3::splat(scale))
    }

    pub fn object_to_world(&self) -> &DMat4 {
        &self.object_to_world
    }

    pub fn world_to_object(&self) -> &DMat4 {
        &self.world_to_object
    }

    /// Per-axis scale, computed once at construction. Shear is ignored.
    pub fn scale(&self) -> DVec3 {
        self.scale
    }

    pub fn point_to_world(&self, p: DVec3) -> DVec3 {
        self.object_to_world.transform_point3(p)
    }

    pub fn point_to_object(&self, p: DVec3) -> DVec3 {
        self.world_to_object.transform_point3(p)
    }

    pub fn direction_to_world(&self, d: DVec3) -> DVec3 {
        self.object_to_world.transform_vector3(d)
    }

    pub fn direction_to_object(&self, d: DVec3) -> DVec3 {
        self.world_to_object.transform_vector3(d)
    }

    /// Object-space normal to a unit world-space normal.
    pub fn normal_to_world(&self, n: DVec3) -> DVec3 {
        self.world_to_object.transform_normal3(n)
    }

    /// The ray expressed in object space. The direction keeps its transformed length,
    /// so object-space parameters equal world-space parameters.
    pub fn ray_to_object(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.point_to_object(ray.origin),
            self.direction_to_object(ray.direction),
            ray.time,
        )
    }

    pub fn aabb_to_world(&self, aabb: &Aabb) -> Aabb {
        self.object_to_world.transform_aabb(aabb)
    }
}
