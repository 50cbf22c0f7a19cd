// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 projective transform.
//!
//! Hyperbolic isometries in the projective model are ordinary 4×4 matrices
//! acting on homogeneous points, so the same type carries Euclidean
//! rotations, uniform scaling, and hyperbolic translations/reflections.

use core::ops::Mul;

use super::point::Point4;

/// A column-major 4×4 transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix. Composition follows the
/// usual convention: `(a * b).apply(p) == a.apply(b.apply(p))`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    /// Creates a transform from four column arrays.
    #[inline]
    #[must_use]
    pub const fn from_cols(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Creates a transform from four row arrays, as matrices are usually
    /// written on paper.
    #[must_use]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut cols = [[0.0_f64; 4]; 4];
        let mut r = 0;
        while r < 4 {
            let mut c = 0;
            while c < 4 {
                cols[c][r] = rows[r][c];
                c += 1;
            }
            r += 1;
        }
        Self { cols }
    }

    /// Returns the element at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= 4`.
    #[inline]
    #[must_use]
    pub const fn at(&self, row: usize, col: usize) -> f64 {
        self.cols[col][row]
    }

    /// Creates a uniform scale about the origin (`w` untouched).
    #[inline]
    #[must_use]
    pub const fn from_uniform_scale(s: f64) -> Self {
        Self::from_rows([
            [s, 0.0, 0.0, 0.0],
            [0.0, s, 0.0, 0.0],
            [0.0, 0.0, s, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the X axis (radians).
    #[must_use]
    pub fn rotation_x(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Y axis (radians).
    #[must_use]
    pub fn rotation_y(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Z axis (radians).
    #[must_use]
    pub fn rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Applies the transform to a homogeneous point.
    #[must_use]
    pub fn apply(&self, p: Point4) -> Point4 {
        let v = p.to_array();
        let mut out = [0.0_f64; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|col| self.cols[col][row] * v[col]).sum();
        }
        Point4::from_array(out)
    }

    /// Returns `self * k` with every entry scaled.
    #[must_use]
    pub fn scaled(mut self, k: f64) -> Self {
        for e in self.cols.iter_mut().flatten() {
            *e *= k;
        }
        self
    }

    /// Returns `self + rhs` entrywise.
    #[must_use]
    pub fn plus(mut self, rhs: &Self) -> Self {
        for (a, b) in self.cols.iter_mut().flatten().zip(rhs.cols.iter().flatten()) {
            *a += b;
        }
        self
    }

    /// Returns the upper-left 3×3 block with the translation column cleared.
    ///
    /// Used to strip scaling/translation artifacts off a rotation before
    /// reapplying magnification.
    #[must_use]
    pub fn linear_part(&self) -> Self {
        let mut out = Self::IDENTITY;
        for c in 0..3 {
            for r in 0..3 {
                out.cols[c][r] = self.cols[c][r];
            }
        }
        out
    }

    /// Is every entry [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|e| e.is_finite())
    }

    /// Is any entry [NaN]?
    ///
    /// [NaN]: f64::is_nan
    #[inline]
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.cols.iter().flatten().any(|e| e.is_nan())
    }

    /// Largest absolute entrywise difference from `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.cols
            .iter()
            .flatten()
            .zip(other.cols.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, e) in col.iter_mut().enumerate() {
                *e = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
    }

    #[test]
    fn from_rows_is_transposed_storage() {
        let t = Transform3d::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        assert_eq!(t.cols[0], [1.0, 5.0, 9.0, 13.0]);
        assert_eq!(t.at(1, 3), 8.0);
    }

    #[test]
    fn identity_multiply() {
        let r = Transform3d::rotation_x(0.3);
        assert_eq!(Transform3d::IDENTITY * r, r);
        assert_eq!(r * Transform3d::IDENTITY, r);
    }

    #[test]
    fn product_applies_right_operand_first() {
        let a = Transform3d::rotation_z(0.4);
        let b = Transform3d::from_uniform_scale(2.0);
        let p = Point4::from_affine(1.0, 0.5, -0.25);
        let lhs = (a * b).apply(p);
        let rhs = a.apply(b.apply(p));
        for (l, r) in lhs.to_array().iter().zip(rhs.to_array()) {
            assert!((l - r).abs() < EPS, "{lhs:?} != {rhs:?}");
        }
    }

    #[test]
    fn rotation_z_quarter_turn_maps_x_to_y() {
        let r = Transform3d::rotation_z(core::f64::consts::FRAC_PI_2);
        let p = r.apply(Point4::from_affine(1.0, 0.0, 0.0));
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn rotation_x_quarter_turn_maps_y_to_z() {
        let r = Transform3d::rotation_x(core::f64::consts::FRAC_PI_2);
        let p = r.apply(Point4::from_affine(0.0, 1.0, 0.0));
        assert!(p.y.abs() < EPS);
        assert!((p.z - 1.0).abs() < EPS);
    }

    #[test]
    fn rotation_y_quarter_turn_maps_z_to_x() {
        let r = Transform3d::rotation_y(core::f64::consts::FRAC_PI_2);
        let p = r.apply(Point4::from_affine(0.0, 0.0, 1.0));
        assert!((p.x - 1.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn linear_part_drops_translation_column() {
        let mut t = Transform3d::rotation_y(0.2);
        t.cols[3] = [4.0, 5.0, 6.0, 1.0];
        assert_eq!(t.linear_part().cols[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.linear_part().cols[0], t.cols[0]);
    }

    #[test]
    fn nan_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(t.is_nan());
    }

    #[test]
    fn infinity_detected() {
        let mut t = Transform3d::IDENTITY;
        t.cols[0][3] = f64::INFINITY;
        assert!(!t.is_finite());
        assert!(!t.is_nan());
    }
}
