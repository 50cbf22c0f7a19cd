// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Step policies for the "fly to node" animation.
//!
//! Each frame of a translation moves the target node some distance along its
//! ray towards the origin. Far out, near the boundary of the unit ball, a
//! small Euclidean step covers a lot of hyperbolic distance, so both
//! policies take steps proportional to the remaining gap to the boundary
//! there. Closer in they take fixed steps of [`TRANSLATION_STEP_DISTANCE`],
//! and once inside that distance they snap to the origin.
//!
//! The two render loops use slightly different far-out rules; they are kept
//! apart on purpose.

use crate::geometry::Point4;
use crate::geometry::hyperbolic::vector_length;

/// Euclidean distance covered per frame in the inner region.
pub const TRANSLATION_STEP_DISTANCE: f64 = 0.05;

/// Smallest far-out step of the adaptive policy.
pub const TRANSLATION_MIN_DELTA: f64 = 0.01;

/// Euclidean distance from the origin beyond which steps shrink with the gap
/// to the boundary.
pub const TRANSLATION_THRESHOLD: f64 = 1.0 - TRANSLATION_STEP_DISTANCE;

/// Where the next frame of a translation moves the target node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TranslationStep {
    /// An intermediate destination on the ray through the node.
    Toward(Point4),
    /// The last step, to the origin.
    Final,
}

/// Moves `source` from Euclidean length `length` to `new_length` along its ray by
/// scaling `w`.
fn shorten(source: Point4, length: f64, new_length: f64) -> TranslationStep {
    let mut destination = source;
    destination.w *= length / new_length;
    TranslationStep::Toward(destination)
}

/// Step of the adaptive render loop.
///
/// Beyond the threshold the node moves by the gap to the boundary, but at
/// least [`TRANSLATION_MIN_DELTA`].
#[must_use]
pub fn adaptive_step(source: Point4) -> TranslationStep {
    let length = vector_length(source);
    if length.is_nan() || length >= 1.0 {
        // Outside the ball or degenerate.
        TranslationStep::Final
    } else if length > TRANSLATION_THRESHOLD {
        let delta = TRANSLATION_MIN_DELTA.max(1.0 - length);
        shorten(source, length, length - delta)
    } else if length > TRANSLATION_STEP_DISTANCE {
        shorten(source, length, length - TRANSLATION_STEP_DISTANCE)
    } else {
        TranslationStep::Final
    }
}

/// Step of the nonadaptive render loop.
///
/// Beyond the threshold the gap to the boundary doubles every frame, with no
/// lower bound on the step.
#[must_use]
pub fn nonadaptive_step(source: Point4) -> TranslationStep {
    let length = vector_length(source);
    if length.is_nan() || length >= 1.0 {
        TranslationStep::Final
    } else if length > TRANSLATION_THRESHOLD {
        shorten(source, length, 2.0 * length - 1.0)
    } else if length > TRANSLATION_STEP_DISTANCE {
        shorten(source, length, length - TRANSLATION_STEP_DISTANCE)
    } else {
        TranslationStep::Final
    }
}
