//! Degree-based angle math.
//!
//! Bearings follow the host convention: 0° = east, angles grow clockwise on
//! screen (toward +y). All outputs are normalized into (-180, 180].

use crate::constants::WHOLE_TOLERANCE;

/// Reduce any finite bearing into (-180, 180].
#[inline]
pub fn normalize(angle: f64) -> f64 {
    let mut reduced = angle % 360.0;
    if reduced <= -180.0 {
        reduced += 360.0;
    } else if reduced > 180.0 {
        reduced -= 360.0;
    }
    reduced
}

/// Signed minimal rotation that takes `from` onto `to`.
#[inline]
pub fn shortest_diff(to: f64, from: f64) -> f64 {
    normalize(to - from)
}

#[inline]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

#[inline]
pub fn rad_to_deg(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// `atan2` in degrees, argument order matching `f64::atan2` (dy, dx).
#[inline]
pub fn atan2_deg(dy: f64, dx: f64) -> f64 {
    rad_to_deg(dy.atan2(dx))
}

/// Bearing of the vector (dx, dy).
#[inline]
pub fn bearing_to(dx: f64, dy: f64) -> f64 {
    atan2_deg(dy, dx)
}

#[inline]
pub fn cos_deg(degrees: f64) -> f64 {
    deg_to_rad(degrees).cos()
}

#[inline]
pub fn sin_deg(degrees: f64) -> f64 {
    deg_to_rad(degrees).sin()
}

#[inline]
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

/// True when `value` lies within `tolerance` of an integer.
#[inline]
pub fn is_whole(value: f64, tolerance: f64) -> bool {
    (value.round() - value).abs() < tolerance
}

#[inline]
pub fn is_whole_default(value: f64) -> bool {
    is_whole(value, WHOLE_TOLERANCE)
}
