//! Local NED (North-East-Down) geometry.
//!
//! Vehicle and target positions live in a flat local frame measured in
//! metres.  Headings are compass-style: 0 points north and angles grow
//! clockwise towards east, matching the yaw convention of marine vehicles.

use std::f64::consts::{PI, TAU};

/// A position in the local North-East-Down frame.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NedPoint {
    pub north: f64,
    pub east:  f64,
    pub down:  f64,
}

impl NedPoint {
    pub const ORIGIN: NedPoint = NedPoint { north: 0.0, east: 0.0, down: 0.0 };

    #[inline]
    pub fn new(north: f64, east: f64, down: f64) -> Self {
        Self { north, east, down }
    }

    /// Euclidean distance in 3-D.
    pub fn distance(self, other: NedPoint) -> f64 {
        let dn = other.north - self.north;
        let de = other.east - self.east;
        let dd = other.down - self.down;
        (dn * dn + de * de + dd * dd).sqrt()
    }

    /// Compass bearing from `self` to `other` in radians, in `(-π, π]`.
    ///
    /// Depth is ignored: the vehicle turns in the horizontal plane only.
    /// Coincident points yield a bearing of 0.
    pub fn bearing_to(self, other: NedPoint) -> f64 {
        (other.east - self.east).atan2(other.north - self.north)
    }

    /// Linear interpolation towards `other`; `fraction` is clamped to `[0, 1]`.
    pub fn lerp(self, other: NedPoint, fraction: f64) -> NedPoint {
        let f = fraction.clamp(0.0, 1.0);
        NedPoint {
            north: self.north + (other.north - self.north) * f,
            east:  self.east + (other.east - self.east) * f,
            down:  self.down + (other.down - self.down) * f,
        }
    }

    /// `true` if no coordinate is NaN or infinite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.north.is_finite() && self.east.is_finite() && self.down.is_finite()
    }
}

impl std::fmt::Display for NedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.north, self.east, self.down)
    }
}

/// Wrap an angle in radians into `(-π, π]`.
///
/// Used to pick the shortest turn between two headings.
pub fn wrap_angle(rad: f64) -> f64 {
    let wrapped = (rad + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
