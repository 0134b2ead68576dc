//! Planar polygon given by its vertices in object space.

use prism_math::{DVec3, Interval, Ray};

use super::LocalHit;

pub(crate) fn intersect(points: &[DVec3], ray: &Ray, ray_t: Interval) -> Option<LocalHit> {
    if points.len() < 3 {
        return None;
    }

    let normal = newell_normal(points);
    if normal == DVec3::ZERO {
        return None;
    }

    let denom = normal.dot(ray.direction);
    if denom == 0.0 {
        return None;
    }

    let origin = points[0];
    let t = normal.dot(origin - ray.origin) / denom;
    if !ray_t.surrounds(t) {
        return None;
    }

    let point = ray.at(t);
    if !contains(points, normal, point) {
        return None;
    }

    let edge_u = points[1] - origin;
    let edge_v = points[points.len() - 1] - origin;
    let local = point - origin;
    let u = local.dot(edge_u) / edge_u.length_squared();
    let v = local.dot(edge_v) / edge_v.length_squared();

    Some(LocalHit {
        t,
        point,
        normal,
        u,
        v,
        tangent: edge_u,
    })
}

/// Area-weighted polygon normal (Newell's method); zero for collinear points.
fn newell_normal(points: &[DVec3]) -> DVec3 {
    let mut n = DVec3::ZERO;
    for (i, current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        n.x += (current.y - next.y) * (current.z + next.z);
        n.y += (current.z - next.z) * (current.x + next.x);
        n.z += (current.x - next.x) * (current.y + next.y);
    }
    if n.length_squared() < 1e-24 {
        DVec3::ZERO
    } else {
        n.normalize()
    }
}

/// Even-odd test after projecting away the normal's dominant axis.
fn contains(points: &[DVec3], normal: DVec3, p: DVec3) -> bool {
    let abs = normal.abs();
    let (a, b) = if abs.x >= abs.y && abs.x >= abs.z {
        (1, 2)
    } else if abs.y >= abs.z {
        (2, 0)
    } else {
        (0, 1)
    };

    let (px, py) = (p[a], p[b]);
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = (points[i][a], points[i][b]);
        let (xj, yj) = (points[j][a], points[j][b]);
        if (yi > py) != (yj > py) {
            let crossing = xi + (py - yi) * (xj - xi) / (yj - yi);
            if px < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_t() -> Interval {
        Interval::new(1e-5, f64::INFINITY)
    }

    fn down_at(x: f64, y: f64) -> Ray {
        Ray::new(DVec3::new(x, y, 5.0), DVec3::NEG_Z, 0.0)
    }

    fn square() -> Vec<DVec3> {
        vec![
            DVec3::new(-1.0, -1.0, 0.0),
            DVec3::new(1.0, -1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(-1.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_square_hit_and_uv() {
        let hit = intersect(&square(), &down_at(0.5, 0.0), any_t()).expect("hit");

        assert!((hit.t - 5.0).abs() < 1e-12);
        assert_eq!(hit.normal, DVec3::Z);
        assert!((hit.u - 0.75).abs() < 1e-12);
        assert!((hit.v - 0.5).abs() < 1e-12);
        assert_eq!(hit.tangent.normalize(), DVec3::X);
    }

    #[test]
    fn test_triangle_rejects_points_outside_edges() {
        let triangle = vec![DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), DVec3::new(0.0, 2.0, 0.0)];

        assert!(intersect(&triangle, &down_at(0.5, 0.5), any_t()).is_some());
        // Inside the triangle's bounding square but past the hypotenuse.
        assert!(intersect(&triangle, &down_at(1.5, 1.5), any_t()).is_none());
    }

    #[test]
    fn test_concave_polygon() {
        let l_shape = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(1.0, 2.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
        ];
        assert!(intersect(&l_shape, &down_at(0.5, 1.5), any_t()).is_some());
        assert!(intersect(&l_shape, &down_at(1.5, 1.5), any_t()).is_none());
    }

    #[test]
    fn test_degenerate_polygons_never_hit() {
        let two = vec![DVec3::ZERO, DVec3::X];
        assert!(intersect(&two, &down_at(0.0, 0.0), any_t()).is_none());

        let collinear = vec![DVec3::ZERO, DVec3::X, DVec3::new(2.0, 0.0, 0.0)];
        assert!(intersect(&collinear, &down_at(0.5, 0.0), any_t()).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray::new(DVec3::new(-5.0, 0.0, 0.0), DVec3::X, 0.0);
        assert!(intersect(&square(), &ray, any_t()).is_none());
    }

    #[test]
    fn test_vertical_polygon_projection() {
        let wall: Vec<DVec3> = square().iter().map(|p| DVec3::new(p.x, 0.0, p.y)).collect();
        let ray = Ray::new(DVec3::new(0.2, -3.0, 0.4), DVec3::Y, 0.0);
        let hit = intersect(&wall, &ray, any_t()).expect("hit");
        assert!((hit.t - 3.0).abs() < 1e-12);
        assert!(hit.normal.y.abs() > 0.999);
    }
}
