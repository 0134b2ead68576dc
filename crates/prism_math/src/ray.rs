use crate::DVec3;

/// A ray in 3D space with origin, direction, and time.
///
/// `time` lies in [0, 1] and selects the interpolated transform of moving objects.
/// The direction is not required to be unit length.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
    pub time: f64,
}

impl Ray {
    pub fn new(origin: DVec3, direction: DVec3, time: f64) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// `origin + t * direction`
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}
