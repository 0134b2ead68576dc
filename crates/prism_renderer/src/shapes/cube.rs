//! Axis-aligned box spanning [-1, 1] in object space.

use prism_math::{DVec3, Interval, Ray};

use super::LocalHit;

pub(crate) fn intersect(ray: &Ray, ray_t: Interval, scale: DVec3) -> Option<LocalHit> {
    let mut t_enter = f64::NEG_INFINITY;
    let mut t_exit = f64::INFINITY;
    let mut enter_normal = DVec3::ZERO;
    let mut exit_normal = DVec3::ZERO;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let dir = ray.direction[axis];

        if dir == 0.0 {
            // Parallel to this slab: inside it everywhere or nowhere.
            if !(-1.0..=1.0).contains(&origin) {
                return None;
            }
            continue;
        }

        let mut t0 = (-1.0 - origin) / dir;
        let mut t1 = (1.0 - origin) / dir;
        let mut outward = DVec3::ZERO;
        outward[axis] = -1.0;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            outward = -outward;
        }

        if t0 > t_enter {
            t_enter = t0;
            enter_normal = outward;
        }
        if t1 < t_exit {
            t_exit = t1;
            exit_normal = -outward;
        }
        if t_enter > t_exit {
            return None;
        }
    }

    let (t, normal) = if ray_t.surrounds(t_enter) {
        (t_enter, enter_normal)
    } else if ray_t.surrounds(t_exit) {
        (t_exit, exit_normal)
    } else {
        return None;
    };

    let mut point = ray.at(t);
    // Snap the face coordinate so UVs and bounds see an exact face.
    for axis in 0..3 {
        if normal[axis] != 0.0 {
            point[axis] = normal[axis];
        }
    }

    let (u, v, tangent) = face_uv(point, normal, scale);
    Some(LocalHit {
        t,
        point,
        normal,
        u,
        v,
        tangent,
    })
}

/// Planar UVs per face, scaled by the object's size so texels stay square.
fn face_uv(p: DVec3, normal: DVec3, scale: DVec3) -> (f64, f64, DVec3) {
    if normal.x != 0.0 {
        ((p.z + 1.0) * scale.z, (p.y + 1.0) * scale.y, DVec3::new(0.0, 0.0, normal.x))
    } else if normal.y != 0.0 {
        ((p.x + 1.0) * scale.x, (p.z + 1.0) * scale.z, DVec3::X)
    } else {
        ((p.x + 1.0) * scale.x, (p.y + 1.0) * scale.y, DVec3::new(normal.z, 0.0, 0.0))
    }
}
