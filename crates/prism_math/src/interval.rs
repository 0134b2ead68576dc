/// Range of ray parameters, or one axis of a bounding box.
///
/// Bounds are closed for [`contains`](Interval::contains); hit acceptance uses
/// the open form, [`surrounds`](Interval::surrounds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Contains nothing; the identity for [`surrounding`](Interval::surrounding).
    pub const EMPTY: Interval = Interval {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub const UNIVERSE: Interval = Interval {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// `min <= x <= max`
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// `min < x < max`
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// True if `other` lies inside this interval. Empty intervals lie inside anything.
    pub fn contains_interval(&self, other: &Interval) -> bool {
        other.is_empty() || (self.min <= other.min && other.max <= self.max)
    }

    /// Grow by `delta` in total, half on each side.
    pub fn expand(&self, delta: f64) -> Interval {
        let half = delta * 0.5;
        Interval::new(self.min - half, self.max + half)
    }

    /// Smallest interval covering both.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// Same lower bound, new upper bound. Used to shrink the search range as
    /// closer hits are found.
    pub fn with_max(&self, max: f64) -> Interval {
        Interval::new(self.min, max)
    }
}
