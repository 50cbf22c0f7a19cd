// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw batch: classified geometry for one frame or refinement pass.

/// Level-of-detail class of a node point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Detail {
    /// Drawn largest. Every node lands here when node sizes are off.
    #[default]
    Near,
    /// Drawn at medium size.
    Middle,
    /// Drawn smallest.
    Far,
}

/// Radius below which a node is drawn as [`Detail::Far`].
pub const FAR_NODES_THRESHOLD: f64 = 0.2;
/// Radius below which a node is drawn as [`Detail::Middle`].
pub const MIDDLE_NODES_THRESHOLD: f64 = 0.5;

impl Detail {
    /// Classifies a node by its visual radius.
    #[must_use]
    pub fn from_radius(radius: f64) -> Self {
        if radius < FAR_NODES_THRESHOLD {
            Self::Far
        } else if radius < MIDDLE_NODES_THRESHOLD {
            Self::Middle
        } else {
            Self::Near
        }
    }
}

/// Points sharing one level of detail.
///
/// `colors` is either empty or parallel to `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointSet {
    /// Display coordinates.
    pub positions: Vec<[f64; 3]>,
    /// Packed `0xRRGGBB` colors.
    pub colors: Vec<u32>,
}

impl PointSet {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the set holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
    }
}

/// Line segments of one link kind.
///
/// `colors` is either empty or holds one color per segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineSet {
    /// Segment endpoints, source first.
    pub segments: Vec<[[f64; 3]; 2]>,
    /// Packed `0xRRGGBB` colors.
    pub colors: Vec<u32>,
}

impl LineSet {
    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the set holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn clear(&mut self) {
        self.segments.clear();
        self.colors.clear();
    }
}

/// Geometry handed to [`Canvas::draw_batch`](crate::canvas::Canvas::draw_batch).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawBatch {
    /// Nodes near the viewer.
    pub near: PointSet,
    /// Nodes at middle distance.
    pub middle: PointSet,
    /// Distant nodes.
    pub far: PointSet,
    /// Spanning-tree links.
    pub tree_links: LineSet,
    /// Non-tree links.
    pub nontree_links: LineSet,
}

impl DrawBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points of one level of detail.
    #[must_use]
    pub fn points(&self, detail: Detail) -> &PointSet {
        match detail {
            Detail::Near => &self.near,
            Detail::Middle => &self.middle,
            Detail::Far => &self.far,
        }
    }

    pub(crate) fn points_mut(&mut self, detail: Detail) -> &mut PointSet {
        match detail {
            Detail::Near => &mut self.near,
            Detail::Middle => &mut self.middle,
            Detail::Far => &mut self.far,
        }
    }

    /// Total number of points and segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.near.len()
            + self.middle.len()
            + self.far.len()
            + self.tree_links.len()
            + self.nontree_links.len()
    }

    /// Whether the batch draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all geometry, keeping allocations.
    pub fn clear(&mut self) {
        self.near.clear();
        self.middle.clear();
        self.far.clear();
        self.tree_links.clear();
        self.nontree_links.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_thresholds_are_exclusive() {
        assert_eq!(Detail::from_radius(0.0), Detail::Far);
        assert_eq!(Detail::from_radius(0.199), Detail::Far);
        assert_eq!(Detail::from_radius(0.2), Detail::Middle);
        assert_eq!(Detail::from_radius(0.499), Detail::Middle);
        assert_eq!(Detail::from_radius(0.5), Detail::Near);
        assert_eq!(Detail::from_radius(1.0), Detail::Near);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut b = DrawBatch::new();
        b.points_mut(Detail::Far).positions.push([0.0; 3]);
        b.tree_links.segments.push([[0.0; 3], [1.0; 3]]);
        assert_eq!(b.len(), 2);
        let cap = b.far.positions.capacity();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.far.positions.capacity(), cap);
    }
}
