// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and link index types.

use core::fmt;
use core::ops::Range;

/// Sentinel stored in index arrays for "no link" (the root's parent).
pub(crate) const NONE: u32 = u32::MAX;

/// Dense index of a node in a [`GraphStore`](super::GraphStore).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub(crate) u32);

impl NodeIndex {
    /// Creates an index from a `usize` slot.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not fit in `u32` (or is the reserved sentinel).
    #[inline]
    #[must_use]
    pub fn new(idx: usize) -> Self {
        let raw = u32::try_from(idx).unwrap_or(NONE);
        assert!(raw != NONE, "node index {idx} out of representable range");
        Self(raw)
    }

    /// Returns the slot as a `usize`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", self.0)
    }
}

/// Dense index of a link in a [`GraphStore`](super::GraphStore).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkIndex(pub(crate) u32);

impl LinkIndex {
    /// Creates an index from a `usize` slot.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not fit in `u32` (or is the reserved sentinel).
    #[inline]
    #[must_use]
    pub fn new(idx: usize) -> Self {
        let raw = u32::try_from(idx).unwrap_or(NONE);
        assert!(raw != NONE, "link index {idx} out of representable range");
        Self(raw)
    }

    /// Returns the slot as a `usize`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LinkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkIndex({})", self.0)
    }
}

/// Whether a link belongs to the spanning tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Parent-to-child link of the spanning tree.
    Tree,
    /// Any other link.
    Nontree,
}

/// A contiguous run of links belonging to one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Links {
    range: Range<u32>,
}

impl Links {
    pub(crate) const fn new(start: u32, end: u32) -> Self {
        Self { range: start..end }
    }

    /// Number of links remaining in the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the run is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl Iterator for Links {
    type Item = LinkIndex;

    #[inline]
    fn next(&mut self) -> Option<LinkIndex> {
        self.range.next().map(LinkIndex)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for Links {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_formats() {
        assert_eq!(format!("{:?}", NodeIndex::new(3)), "NodeIndex(3)");
        assert_eq!(format!("{:?}", LinkIndex::new(7)), "LinkIndex(7)");
    }

    #[test]
    #[should_panic(expected = "out of representable range")]
    fn sentinel_is_rejected() {
        let _ = NodeIndex::new(u32::MAX as usize);
    }

    #[test]
    fn links_iterates_range() {
        let links: Vec<_> = Links::new(2, 5).collect();
        assert_eq!(links, [LinkIndex(2), LinkIndex(3), LinkIndex(4)]);
        assert!(Links::new(4, 4).is_empty());
    }
}
