// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object transform state owned by a render loop.

use crate::canvas::Canvas;
use crate::geometry::Transform3d;
use crate::graph::NodeIndex;

/// Factor applied by [`ViewParameters::increase_magnification`].
pub const MAGNIFICATION_STEP: f64 = 1.25;

/// A complete view that can be saved and restored across render loops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayPosition {
    /// Node the hyperbolic translation is centered on.
    pub center_node: NodeIndex,
    /// Euclidean rotation of the object, without magnification.
    pub rotation: Transform3d,
    /// Accumulated hyperbolic translation.
    pub translation: Transform3d,
}

/// Rotation and magnification of the displayed object.
///
/// Rotations accumulate on the left. Magnification is kept apart from the
/// rotation and applied as a uniform scale, so repeated zooming never
/// distorts the rotation. Saved rotations form a stack, paired with the
/// transformer's position stack.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewParameters {
    rotation: Transform3d,
    magnification: f64,
    saved: Vec<Transform3d>,
}

impl ViewParameters {
    /// Unrotated, unmagnified view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rotation: Transform3d::IDENTITY,
            magnification: 1.0,
            saved: Vec::new(),
        }
    }

    /// Rotation followed by magnification.
    #[must_use]
    pub fn object_transform(&self) -> Transform3d {
        Transform3d::from_uniform_scale(self.magnification) * self.rotation
    }

    /// Object transform composed under a canvas view transform.
    #[must_use]
    pub fn object_to_device(&self, view: &Transform3d) -> Transform3d {
        *view * self.object_transform()
    }

    /// Current rotation, without magnification.
    #[must_use]
    pub fn rotation(&self) -> Transform3d {
        self.rotation
    }

    /// Replaces the rotation. Magnification is unchanged.
    pub fn set_rotation(&mut self, rotation: Transform3d) {
        self.rotation = rotation;
    }

    /// Applies `delta` after the current rotation.
    pub fn extend(&mut self, delta: &Transform3d) {
        self.rotation = *delta * self.rotation;
    }

    /// Pushes the current rotation.
    pub fn save(&mut self) {
        self.saved.push(self.rotation);
    }

    /// Pops the most recently saved rotation and makes it current. Returns
    /// `false`, changing nothing, if none is saved.
    pub fn restore(&mut self) -> bool {
        match self.saved.pop() {
            Some(rotation) => {
                self.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Drops the most recently saved rotation.
    pub fn discard(&mut self) {
        self.saved.pop();
    }

    /// Clears rotation and magnification. Saved rotations are kept.
    pub fn reset(&mut self) {
        self.rotation = Transform3d::IDENTITY;
        self.magnification = 1.0;
    }

    /// Current magnification.
    #[must_use]
    pub fn magnification(&self) -> f64 {
        self.magnification
    }

    /// Sets the magnification. Non-positive or non-finite values are ignored.
    pub fn set_magnification(&mut self, magnification: f64) {
        if magnification.is_finite() && magnification > 0.0 {
            self.magnification = magnification;
        }
    }

    /// Zooms in by [`MAGNIFICATION_STEP`].
    pub fn increase_magnification(&mut self) {
        self.magnification *= MAGNIFICATION_STEP;
    }

    /// Zooms out by the inverse of [`MAGNIFICATION_STEP`].
    pub fn decrease_magnification(&mut self) {
        self.magnification /= MAGNIFICATION_STEP;
    }

    /// Returns to unit magnification.
    pub fn reset_magnification(&mut self) {
        self.magnification = 1.0;
    }

    /// Installs the object transform as the canvas model transform.
    pub fn put_model_transform(&self, canvas: &mut impl Canvas) {
        canvas.set_model_transform(&self.object_transform());
    }
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self::new()
    }
}
