// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builders for hyperbolic isometries in the projective model of H³.
//!
//! All points are homogeneous [`Point4`]s whose Minkowski self inner product
//! is negative. The construction follows Phillips and Gunn, "Visualizing
//! Hyperbolic Space": a reflection through a point `p` is
//!
//! ```text
//! R(p) = I − 2·p·pᵗ·diag(1, 1, 1, −1) / ⟨p, p⟩
//! ```
//!
//! and the translation carrying `s` to `d` is `R(m)·R(s)` where `m` is the
//! Minkowski-weighted midpoint of `s` and `d`. Geodesics of this model are
//! straight Euclidean segments inside the unit ball.

use super::point::Point4;
use super::transform::Transform3d;
use crate::error::GeometryError;

/// Polar angles closer to zero than this skip the alignment rotation.
const POLAR_EPSILON: f64 = 1e-10;

/// Reflection through the hyperbolic point `p`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroInnerProduct`] when `⟨p, p⟩ = 0`.
pub fn reflection(p: Point4) -> Result<Transform3d, GeometryError> {
    let ipp = p.minkowski(p);
    if ipp == 0.0 {
        return Err(GeometryError::ZeroInnerProduct);
    }
    Ok(reflection_unchecked(p, ipp))
}

/// `ipp` must be `p.minkowski(p)` and non-zero.
fn reflection_unchecked(p: Point4, ipp: f64) -> Transform3d {
    let Point4 { x, y, z, w } = p;
    // p·pᵗ·diag(1, 1, 1, −1), one row at a time.
    let outer = Transform3d::from_rows([
        [x * x, x * y, x * z, -x * w],
        [x * y, y * y, y * z, -y * w],
        [x * z, y * z, z * z, -z * w],
        [x * w, y * w, z * w, -w * w],
    ]);
    outer.scaled(-2.0 / ipp).plus(&Transform3d::IDENTITY)
}

/// Hyperbolic translation carrying `source` to `dest` along their geodesic.
///
/// `translation(p, p)` is the identity.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroInnerProduct`] if either reflection center
/// is degenerate, or [`GeometryError::NonFinite`] if the points do not lie
/// on the same sheet of the hyperboloid (the midpoint weights are then
/// imaginary).
pub fn translation(source: Point4, dest: Point4) -> Result<Transform3d, GeometryError> {
    let ss = source.minkowski(source);
    let dd = dest.minkowski(dest);
    let sd = source.minkowski(dest);

    let midpoint = source.scaled((dd * sd).sqrt()).plus(dest.scaled((ss * sd).sqrt()));
    if !midpoint.is_finite() {
        return Err(GeometryError::NonFinite);
    }

    let reflect_mid = reflection(midpoint)?;
    if ss == 0.0 {
        return Err(GeometryError::ZeroInnerProduct);
    }
    let m = reflect_mid * reflection_unchecked(source, ss);
    if m.is_finite() {
        Ok(m)
    } else {
        Err(GeometryError::NonFinite)
    }
}

/// The matrix taking the origin to `a` and the positive x-axis onto the
/// hyperbolic line from `a` through `b`.
///
/// The line's closest point to the origin (the pivot) is moved to the
/// origin, then `a`, and finally the image of `b` is rotated onto the x-axis
/// using its spherical angles. A polar angle within `1e-10` of zero skips the
/// rotation.
///
/// # Errors
///
/// Returns [`GeometryError::BothAtOrigin`] if neither anchor leaves the
/// origin, and [`GeometryError::NonFinite`] for other degenerate input such
/// as `a == b`.
pub fn canonical_orientation(a: Point4, b: Point4) -> Result<Transform3d, GeometryError> {
    if euclidean_norm(a) == 0.0 && euclidean_norm(b) == 0.0 {
        return Err(GeometryError::BothAtOrigin);
    }

    let pivot = pivot_point(a, b);
    let mut result = translation(Point4::ORIGIN, pivot)?;

    let to_origin = translation(pivot, Point4::ORIGIN)?;
    let mut pa = to_origin.apply(a).project();
    let mut pb = to_origin.apply(b).project();

    result = result * translation(Point4::ORIGIN, pa)?;

    let to_origin = translation(pa, Point4::ORIGIN)?;
    pa = to_origin.apply(pa).project();
    pb = to_origin.apply(pb).project();
    debug_assert!(euclidean_norm(pa) < 1e-6, "anchor did not reach the origin: {pa:?}");

    let rho = euclidean_norm(pb);
    let phi = (pb.x / rho).clamp(-1.0, 1.0).acos();
    let theta = pb.z.atan2(pb.y);
    if phi.abs() > POLAR_EPSILON {
        result = result * Transform3d::rotation_x(theta) * Transform3d::rotation_z(phi);
    } else {
        tracing::trace!(phi, "canonical orientation already aligned with x-axis");
    }

    if result.is_finite() {
        Ok(result)
    } else {
        Err(GeometryError::NonFinite)
    }
}

/// Closest point to the origin on the line through `a` and `b`, computed in
/// affine coordinates with the ordinary dot product.
fn pivot_point(a: Point4, b: Point4) -> Point4 {
    let a3 = a.affine();
    let b3 = b.affine();
    let a_minus_b = [a3[0] - b3[0], a3[1] - b3[1], a3[2] - b3[2]];
    let b_minus_a = a_minus_b.map(|c| -c);
    let ka = dot(b3, b_minus_a);
    let kb = dot(a3, a_minus_b);
    let len2 = dot(a_minus_b, a_minus_b);
    Point4::from_affine(
        (ka * a3[0] + kb * b3[0]) / len2,
        (ka * a3[1] + kb * b3[1]) / len2,
        (ka * a3[2] + kb * b3[2]) / len2,
    )
}

/// Rotation about the X axis.
#[inline]
#[must_use]
pub fn x_rotation(angle: f64) -> Transform3d {
    Transform3d::rotation_x(angle)
}

/// Rotation about the Y axis.
#[inline]
#[must_use]
pub fn y_rotation(angle: f64) -> Transform3d {
    Transform3d::rotation_y(angle)
}

/// Rotation about the Z axis.
#[inline]
#[must_use]
pub fn z_rotation(angle: f64) -> Transform3d {
    Transform3d::rotation_z(angle)
}

/// Euclidean rotation by `angle` about the unit-length `axis`.
///
/// The axis is not normalized here; a non-unit axis yields a non-orthogonal
/// matrix.
#[must_use]
pub fn euclidean_rotation(angle: f64, axis: [f64; 3]) -> Transform3d {
    let (s, c) = angle.sin_cos();
    let c1 = 1.0 - c;
    let [u1, u2, u3] = axis;
    let u1u2c1 = u1 * u2 * c1;
    let u1u3c1 = u1 * u3 * c1;
    let u2u3c1 = u2 * u3 * c1;
    let (u1s, u2s, u3s) = (u1 * s, u2 * s, u3 * s);
    let (u1sq, u2sq, u3sq) = (u1 * u1, u2 * u2, u3 * u3);
    Transform3d::from_rows([
        [u1sq + c * (1.0 - u1sq), u1u2c1 - u3s, u1u3c1 + u2s, 0.0],
        [u1u2c1 + u3s, u2sq + c * (1.0 - u2sq), u2u3c1 - u1s, 0.0],
        [u1u3c1 - u2s, u2u3c1 + u1s, u3sq + c * (1.0 - u3sq), 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Euclidean length of the affine point `(x, y, z) / w`.
#[inline]
#[must_use]
pub fn vector_length(p: Point4) -> f64 {
    euclidean_norm(p) / p.w
}

/// Visual radius of a node drawn at `p`.
///
/// With `r` the Euclidean distance of the affine point from the origin this
/// is `1 − r²`, which shrinks towards zero at the boundary of the unit ball.
/// Degenerate input maps to zero. Every path that computes node radii goes
/// through this function so node sizes agree across render modes.
#[must_use]
pub fn node_radius(p: Point4) -> f64 {
    let r = vector_length(p);
    let radius = 1.0 - r * r;
    if radius.is_finite() {
        radius.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Hyperbolic distance between two points.
#[must_use]
pub fn hyperbolic_distance(a: Point4, b: Point4) -> f64 {
    let cosh = -a.minkowski(b) / (a.minkowski(a) * b.minkowski(b)).sqrt();
    cosh.max(1.0).acosh()
}

fn euclidean_norm(p: Point4) -> f64 {
    (p.x * p.x + p.y * p.y + p.z * p.z).sqrt()
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_point_eq(actual: Point4, expected: Point4) {
        let a = actual.project();
        let e = expected.project();
        for (x, y) in a.to_array().iter().zip(e.to_array()) {
            assert!((x - y).abs() < EPS, "{a:?} != {e:?}");
        }
    }

    fn sample_points() -> [Point4; 4] {
        [
            Point4::from_affine(0.3, 0.0, 0.0),
            Point4::from_affine(-0.2, 0.5, 0.1),
            Point4::from_affine(0.1, -0.1, -0.7),
            Point4::new(0.4, 0.4, 0.4, 2.0),
        ]
    }

    #[test]
    fn translation_from_origin_reaches_target() {
        for p in sample_points() {
            let t = translation(Point4::ORIGIN, p).unwrap();
            assert_point_eq(t.apply(Point4::ORIGIN), p);
        }
    }

    #[test]
    fn translation_to_origin_reaches_origin() {
        for p in sample_points() {
            let t = translation(p, Point4::ORIGIN).unwrap();
            assert_point_eq(t.apply(p), Point4::ORIGIN);
        }
    }

    #[test]
    fn translation_to_self_is_identity() {
        let p = Point4::from_affine(0.25, -0.1, 0.3);
        let t = translation(p, p).unwrap();
        assert!(t.max_abs_diff(&Transform3d::IDENTITY) < EPS, "{t:?}");
    }

    #[test]
    fn translation_preserves_distance() {
        let [a, b, c, _] = sample_points();
        let t = translation(a, b).unwrap();
        let before = hyperbolic_distance(b, c);
        let after = hyperbolic_distance(t.apply(b), t.apply(c));
        assert!((before - after).abs() < EPS, "{before} != {after}");
    }

    #[test]
    fn reflection_is_an_involution() {
        for p in sample_points() {
            let r = reflection(p).unwrap();
            assert!((r * r).max_abs_diff(&Transform3d::IDENTITY) < EPS);
        }
    }

    #[test]
    fn reflection_of_origin_flips_w() {
        let r = reflection(Point4::ORIGIN).unwrap();
        let expected = Transform3d::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, -1.0],
        ]);
        assert!(r.max_abs_diff(&expected) < EPS);
    }

    #[test]
    fn reflection_rejects_light_like_point() {
        let p = Point4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(reflection(p), Err(GeometryError::ZeroInnerProduct));
        assert_eq!(
            translation(p, Point4::ORIGIN),
            Err(GeometryError::ZeroInnerProduct)
        );
    }

    #[test]
    fn canonical_orientation_rejects_origin_pair() {
        assert_eq!(
            canonical_orientation(Point4::ORIGIN, Point4::new(0.0, 0.0, 0.0, 3.0)),
            Err(GeometryError::BothAtOrigin)
        );
    }

    #[test]
    fn canonical_orientation_rejects_coincident_anchors() {
        let p = Point4::from_affine(0.2, 0.2, 0.0);
        assert_eq!(canonical_orientation(p, p), Err(GeometryError::NonFinite));
    }

    #[test]
    fn canonical_orientation_maps_origin_to_first_anchor() {
        let a = Point4::from_affine(0.2, 0.1, 0.0);
        let b = Point4::from_affine(-0.3, 0.4, 0.2);
        let m = canonical_orientation(a, b).unwrap();
        assert_point_eq(m.apply(Point4::ORIGIN), a);
    }

    #[test]
    fn canonical_orientation_maps_x_axis_onto_line() {
        let a = Point4::from_affine(0.2, 0.1, 0.0);
        let b = Point4::from_affine(-0.3, 0.4, 0.2);
        let m = canonical_orientation(a, b).unwrap();
        let q = m.apply(Point4::from_affine(0.5, 0.0, 0.0)).affine();
        let a3 = a.affine();
        let b3 = b.affine();
        let qa = [q[0] - a3[0], q[1] - a3[1], q[2] - a3[2]];
        let ba = [b3[0] - a3[0], b3[1] - a3[1], b3[2] - a3[2]];
        let cross = [
            qa[1] * ba[2] - qa[2] * ba[1],
            qa[2] * ba[0] - qa[0] * ba[2],
            qa[0] * ba[1] - qa[1] * ba[0],
        ];
        assert!(dot(cross, cross).sqrt() < EPS, "{q:?} is off the line");
        assert!(dot(qa, ba) > 0.0, "x-axis points away from b");
    }

    #[test]
    fn canonical_orientation_on_x_axis_skips_rotation() {
        let a = Point4::ORIGIN;
        let b = Point4::from_affine(0.5, 0.0, 0.0);
        let m = canonical_orientation(a, b).unwrap();
        assert!(m.max_abs_diff(&Transform3d::IDENTITY) < EPS, "{m:?}");
    }

    #[test]
    fn euclidean_rotation_about_z_matches_axis_rotation() {
        let angle = 0.7;
        let m = euclidean_rotation(angle, [0.0, 0.0, 1.0]);
        assert!(m.max_abs_diff(&z_rotation(angle)) < EPS);
        let m = euclidean_rotation(angle, [1.0, 0.0, 0.0]);
        assert!(m.max_abs_diff(&x_rotation(angle)) < EPS);
        let m = euclidean_rotation(angle, [0.0, 1.0, 0.0]);
        assert!(m.max_abs_diff(&y_rotation(angle)) < EPS);
    }

    #[test]
    fn node_radius_shrinks_towards_boundary() {
        assert_eq!(node_radius(Point4::ORIGIN), 1.0);
        let mid = node_radius(Point4::from_affine(0.5, 0.0, 0.0));
        assert!((mid - 0.75).abs() < EPS);
        let far = node_radius(Point4::new(0.0, 0.0, 0.99, 1.0));
        assert!(far < 0.05);
        assert_eq!(node_radius(Point4::from_affine(2.0, 0.0, 0.0)), 0.0);
        assert_eq!(node_radius(Point4::new(f64::NAN, 0.0, 0.0, 1.0)), 0.0);
    }

    #[test]
    fn vector_length_divides_by_w() {
        assert!((vector_length(Point4::new(0.0, 3.0, 4.0, 10.0)) - 0.5).abs() < EPS);
    }
}
