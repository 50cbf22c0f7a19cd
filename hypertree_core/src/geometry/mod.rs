// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Projective geometry for the hyperboloid model of H³.
//!
//! - [`Point4`]: homogeneous point with the Minkowski inner product.
//! - [`Transform3d`]: column-major 4×4 matrix acting on [`Point4`].
//! - [`hyperbolic`]: reflection, translation, canonical orientation and
//!   rotation builders, plus the node radius shared by every render path.

pub mod hyperbolic;
mod point;
mod transform;

pub use point::Point4;
pub use transform::Transform3d;
