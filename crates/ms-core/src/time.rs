//! Virtual time.
//!
//! # Design
//!
//! Virtual time is a non-negative real number advanced only by the event
//! queue.  It is unrelated to wall-clock time: one unit is whatever the
//! scenario says it is (the mission configuration treats it as seconds).
//!
//! `f64` has no total order, so `SimTime` orders itself with
//! [`f64::total_cmp`].  The event queue rejects negative and non-finite
//! delays before they ever become a `SimTime`, which keeps the order equal to
//! the numeric one for every value the simulation produces.

use std::cmp::Ordering;
use std::fmt;

/// An absolute point in virtual time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// The instant `delay` units after `self`.
    #[inline]
    pub fn after(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay)
    }

    /// Time elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl std::hash::Hash for SimTime {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // `total_cmp` equality is bit equality.
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        self.after(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.since(rhs)
    }
}

impl From<f64> for SimTime {
    fn from(t: f64) -> Self {
        SimTime(t)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}
