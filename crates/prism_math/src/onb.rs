use glam::{DMat3, DVec3};

/// Orthonormal frame whose third axis is a given direction.
///
/// Columns are (u, v, w): two perpendicular tangents and the direction itself.
pub fn generate_onb(w: DVec3) -> DMat3 {
    debug_assert!(w.is_normalized());

    let helper = if w.x.abs() > 0.9 { DVec3::Y } else { DVec3::X };
    let u = w.cross(helper).normalize();
    let v = w.cross(u);
    DMat3::from_cols(u, v, w)
}
