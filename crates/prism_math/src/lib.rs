// Re-export glam for convenience
pub use glam::*;

// Prism math types
mod aabb;
mod interval;
pub mod motion;
mod onb;
mod ray;
pub mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use motion::{interpolate, Decomposed, Motion};
pub use onb::generate_onb;
pub use ray::Ray;
pub use transform::{trs_matrix, Mat4Ext, Transform};

/// Linear RGB color.
pub type Color = DVec3;
