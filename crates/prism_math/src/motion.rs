//! Motion-blur interpolation between two affine transforms.
//!
//! Interpolating matrix entries directly shears rotating objects, so both endpoints
//! are decomposed into translation, per-axis scale and a rotation quaternion.
//! Translation and scale are lerped, rotation is slerped, and the result is
//! recomposed.

use glam::{DMat3, DMat4, DQuat, DVec3};

/// Basis vectors shorter than this are treated as collapsed.
const DEGENERATE_SCALE: f64 = 1e-10;

/// Above this quaternion dot product slerp falls back to normalized lerp.
const SLERP_LINEAR_THRESHOLD: f64 = 0.9995;

/// An affine transform split into its translation, rotation and scale parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposed {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Decomposed {
    /// Split `m` into translation (last column), scale (basis lengths) and rotation.
    ///
    /// Shear and reflection are not representable and are dropped. If any basis
    /// vector is shorter than 1e-10 the rotation is the identity.
    pub fn from_matrix(m: &DMat4) -> Self {
        let translation = m.w_axis.truncate();
        let x = m.x_axis.truncate();
        let y = m.y_axis.truncate();
        let z = m.z_axis.truncate();
        let scale = DVec3::new(x.length(), y.length(), z.length());

        let rotation = if scale.min_element() < DEGENERATE_SCALE {
            DQuat::IDENTITY
        } else {
            rotation_from_basis(&DMat3::from_cols(x / scale.x, y / scale.y, z / scale.z))
        };

        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Recompose into `T * R * S`.
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.translation)
            * DMat4::from_mat3(DMat3::from_quat(self.rotation))
            * DMat4::from_scale(self.scale)
    }

    /// Lerp translation and scale, slerp rotation.
    pub fn lerp(&self, other: &Decomposed, t: f64) -> Decomposed {
        Decomposed {
            translation: self.translation.lerp(other.translation, t),
            rotation: slerp(self.rotation, other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

/// Extract a unit quaternion from an orthonormal rotation matrix.
///
/// Branches on the trace and the largest diagonal term so the square root is always
/// taken of a value bounded away from zero.
pub fn rotation_from_basis(r: &DMat3) -> DQuat {
    // m{row}{col}; glam stores columns.
    let (m00, m10, m20) = (r.x_axis.x, r.x_axis.y, r.x_axis.z);
    let (m01, m11, m21) = (r.y_axis.x, r.y_axis.y, r.y_axis.z);
    let (m02, m12, m22) = (r.z_axis.x, r.z_axis.y, r.z_axis.z);
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        DQuat::from_xyzw((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
    } else if m00 > m11 && m00 > m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
        DQuat::from_xyzw(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
    } else if m11 > m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
        DQuat::from_xyzw((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
        DQuat::from_xyzw((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
    };

    q.normalize()
}

/// Spherical linear interpolation along the shorter arc.
pub fn slerp(a: DQuat, b: DQuat, t: f64) -> DQuat {
    let mut dot = a.dot(b);
    let mut b = b;
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    if dot > SLERP_LINEAR_THRESHOLD {
        return (a + (b - a) * t).normalize();
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    (a * s0 + b * s1).normalize()
}

/// Start and end object->world matrices of a moving object over the shutter interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    start: Decomposed,
    end: Decomposed,
}

impl Motion {
    pub fn new(start: &DMat4, end: &DMat4) -> Self {
        Self {
            start: Decomposed::from_matrix(start),
            end: Decomposed::from_matrix(end),
        }
    }

    /// The object->world matrix at shutter time `t` in [0, 1].
    pub fn matrix_at(&self, t: f64) -> DMat4 {
        self.start.lerp(&self.end, t.clamp(0.0, 1.0)).to_matrix()
    }
}

/// Interpolate two affine matrices through their TRS decompositions.
pub fn interpolate(start: &DMat4, end: &DMat4, t: f64) -> DMat4 {
    Motion::new(start, end).matrix_at(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::trs_matrix;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn vec3_in(lo: f64, hi: f64) -> impl Strategy<Value = DVec3> {
        (lo..hi, lo..hi, lo..hi).prop_map(|(x, y, z)| DVec3::new(x, y, z))
    }

    #[test]
    fn test_decompose_recovers_parts() {
        let m = trs_matrix(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(0.3, 0.2, 0.1),
            DVec3::new(2.0, 3.0, 4.0),
        );
        let d = Decomposed::from_matrix(&m);

        assert!((d.translation - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-12);
        assert!((d.scale - DVec3::new(2.0, 3.0, 4.0)).length() < 1e-12);
        assert!(d.to_matrix().abs_diff_eq(m, 1e-12));
    }

    #[test]
    fn test_rotation_from_basis_all_branches() {
        // Near-180 degree turns about each axis drive the trace negative and exercise
        // each diagonal branch.
        for axis in [DVec3::X, DVec3::Y, DVec3::Z, DVec3::new(1.0, 1.0, 0.0).normalize()] {
            for angle in [0.1, 1.0, 3.0, PI] {
                let q = DQuat::from_axis_angle(axis, angle);
                let back = rotation_from_basis(&DMat3::from_quat(q));
                assert!(back.dot(q).abs() > 1.0 - 1e-12, "axis {axis:?} angle {angle}");
            }
        }
    }

    #[test]
    fn test_degenerate_scale_gives_identity_rotation() {
        let m = trs_matrix(DVec3::ONE, DVec3::new(0.5, 0.5, 0.5), DVec3::new(1.0, 0.0, 1.0));
        let d = Decomposed::from_matrix(&m);
        assert_eq!(d.rotation, DQuat::IDENTITY);
        assert!(d.rotation.is_finite());
    }

    #[test]
    fn test_slerp_takes_shortest_path() {
        let a = DQuat::from_rotation_z(0.0);
        let b = -DQuat::from_rotation_z(PI / 2.0);
        let mid = slerp(a, b, 0.5);
        let expected = DQuat::from_rotation_z(PI / 4.0);
        assert!(mid.dot(expected).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_slerp_nearly_parallel_is_finite() {
        let a = DQuat::from_rotation_x(1.0);
        let b = DQuat::from_rotation_x(1.0 + 1e-9);
        let q = slerp(a, b, 0.3);
        assert!(q.is_finite());
        assert!((q.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolated_rotation_stays_rigid() {
        let start = trs_matrix(DVec3::ZERO, DVec3::ZERO, DVec3::ONE);
        let end = trs_matrix(DVec3::new(4.0, 0.0, 0.0), DVec3::new(0.0, 0.0, PI / 2.0), DVec3::ONE);
        let mid = interpolate(&start, &end, 0.5);

        // A lerped matrix would shrink the basis; slerp keeps it unit length.
        assert!((mid.x_axis.truncate().length() - 1.0).abs() < 1e-12);
        let p = mid.transform_point3(DVec3::X);
        let c = (PI / 4.0).cos();
        assert!((p - DVec3::new(2.0 + c, c, 0.0)).length() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_interpolate_hits_endpoints(
            t0 in vec3_in(-10.0, 10.0), r0 in vec3_in(-PI, PI), s0 in vec3_in(0.1, 5.0),
            t1 in vec3_in(-10.0, 10.0), r1 in vec3_in(-PI, PI), s1 in vec3_in(0.1, 5.0),
        ) {
            let start = trs_matrix(t0, r0, s0);
            let end = trs_matrix(t1, r1, s1);
            prop_assert!(interpolate(&start, &end, 0.0).abs_diff_eq(start, 1e-9));
            prop_assert!(interpolate(&start, &end, 1.0).abs_diff_eq(end, 1e-9));
        }

        #[test]
        fn prop_interpolated_round_trip(
            t0 in vec3_in(-10.0, 10.0), r0 in vec3_in(-PI, PI), s0 in vec3_in(0.1, 5.0),
            t1 in vec3_in(-10.0, 10.0), r1 in vec3_in(-PI, PI), s1 in vec3_in(0.1, 5.0),
            time in 0.0..=1.0f64,
            p in vec3_in(-20.0, 20.0),
        ) {
            let motion = Motion::new(&trs_matrix(t0, r0, s0), &trs_matrix(t1, r1, s1));
            let transform = crate::Transform::from_matrix(motion.matrix_at(time));
            let back = transform.point_to_object(transform.point_to_world(p));
            prop_assert!((back - p).length() <= 1e-8 * (1.0 + p.length()));
        }
    }
}
