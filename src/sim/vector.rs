//! 2D vector value type
//!
//! Thin wrapper over `glam::DVec2` that pins down the degenerate cases the
//! simulation relies on: normalizing a near-zero vector gives zero, and the
//! angle between a zero vector and anything is undefined.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;

/// Immutable 2D vector (track units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D(DVec2);

impl Vector2D {
    pub const ZERO: Self = Self(DVec2::ZERO);

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self(DVec2::new(x, y))
    }

    /// Unit vector pointing along `angle` (radians, counter-clockwise from +x)
    #[inline]
    pub fn from_angle(angle: f64) -> Self {
        Self(DVec2::from_angle(angle))
    }

    #[inline]
    pub fn x(self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.0.dot(other.0)
    }

    #[inline]
    pub fn magnitude(self) -> f64 {
        self.0.length()
    }

    /// Unit vector in the same direction, or zero when the magnitude is
    /// at or below epsilon
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag <= EPSILON {
            return Self::ZERO;
        }
        Self(self.0 / mag)
    }

    /// Rotate counter-clockwise by `angle` radians
    #[inline]
    pub fn rotate(self, angle: f64) -> Self {
        Self(DVec2::from_angle(angle).rotate(self.0))
    }

    #[inline]
    pub fn distance_to(self, other: Self) -> f64 {
        self.0.distance(other.0)
    }

    /// Unsigned angle between two vectors in radians.
    ///
    /// Returns `None` when either vector is (near) zero. The cosine is
    /// clamped to [-1, 1] before `acos` so round-off cannot produce NaN.
    pub fn angle_between(self, other: Self) -> Option<f64> {
        let mag_u = self.magnitude();
        let mag_v = other.magnitude();
        if mag_u < EPSILON || mag_v < EPSILON {
            return None;
        }
        let cos_theta = (self.dot(other) / (mag_u * mag_v)).clamp(-1.0, 1.0);
        Some(cos_theta.acos())
    }

    #[inline]
    pub fn as_dvec2(self) -> DVec2 {
        self.0
    }
}

impl From<DVec2> for Vector2D {
    fn from(v: DVec2) -> Self {
        Self(v)
    }
}

impl From<(f64, f64)> for Vector2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Vector2D {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Vector2D {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Vector2D {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Vector2D {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self(self.0 * scalar)
    }
}

impl Neg for Vector2D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}
