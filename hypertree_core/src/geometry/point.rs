// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Homogeneous points.

/// A homogeneous point `(x, y, z, w)` in projective 3-space.
///
/// Points of hyperbolic space in the hyperboloid (projective) model have a
/// negative Minkowski self inner product; the affine point `(x/w, y/w, z/w)`
/// lies inside the unit ball.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point4 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// Homogeneous weight.
    pub w: f64,
}

impl Point4 {
    /// The hyperbolic origin `(0, 0, 0, 1)`.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a point from its four homogeneous components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a point from affine coordinates (`w = 1`).
    #[inline]
    #[must_use]
    pub const fn from_affine(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 1.0)
    }

    /// Returns the point divided through by `w`.
    #[inline]
    #[must_use]
    pub fn project(self) -> Self {
        Self::new(self.x / self.w, self.y / self.w, self.z / self.w, 1.0)
    }

    /// Returns the affine `[x/w, y/w, z/w]` components.
    #[inline]
    #[must_use]
    pub fn affine(self) -> [f64; 3] {
        [self.x / self.w, self.y / self.w, self.z / self.w]
    }

    /// Returns the components as `[x, y, z, w]`.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Creates a point from `[x, y, z, w]`.
    #[inline]
    #[must_use]
    pub const fn from_array(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// Minkowski inner product `a.x·b.x + a.y·b.y + a.z·b.z − a.w·b.w`.
    #[inline]
    #[must_use]
    pub fn minkowski(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z - self.w * other.w
    }

    /// Returns `self * s` componentwise.
    #[inline]
    #[must_use]
    pub fn scaled(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    /// Returns `self + other` componentwise.
    #[inline]
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }

    /// Whether all four components are finite.
    #[inline]
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl Default for Point4 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_timelike() {
        assert_eq!(Point4::ORIGIN.minkowski(Point4::ORIGIN), -1.0);
    }

    #[test]
    fn project_divides_by_w() {
        let p = Point4::new(1.0, 2.0, 3.0, 4.0).project();
        assert_eq!(p, Point4::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!(Point4::new(2.0, 0.0, 0.0, 2.0).affine(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn non_finite_detected() {
        assert!(Point4::ORIGIN.is_finite());
        assert!(!Point4::new(f64::NAN, 0.0, 0.0, 1.0).is_finite());
        assert!(!Point4::new(0.0, 0.0, 0.0, f64::INFINITY).is_finite());
    }
}
