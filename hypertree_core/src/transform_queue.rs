// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity max-heap that orders traversal by visual radius.

use crate::error::TransformQueueError;
use crate::graph::NodeIndex;

/// Binary max-heap of nodes keyed by their most recent radius.
///
/// Storage is 1-based; slot 0 is unused. Capacity is fixed at construction
/// and is the node count of the graph: each node is enqueued at most once per
/// generation.
#[derive(Clone, Debug)]
pub struct TransformQueue {
    nodes: Vec<u32>,
    radii: Vec<f64>,
    len: usize,
}

impl TransformQueue {
    /// Creates an empty queue holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![0; capacity + 1],
            radii: vec![0.0; capacity + 1],
            len: 0,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Inserts `node` with key `radius`.
    pub fn enqueue(&mut self, node: NodeIndex, radius: f64) -> Result<(), TransformQueueError> {
        if self.len == self.capacity() {
            return Err(TransformQueueError::Overflow {
                capacity: self.capacity(),
            });
        }
        self.len += 1;
        let mut i = self.len;
        while i > 1 && self.radii[i / 2] < radius {
            self.radii[i] = self.radii[i / 2];
            self.nodes[i] = self.nodes[i / 2];
            i /= 2;
        }
        self.radii[i] = radius;
        self.nodes[i] = node.0;
        Ok(())
    }

    /// Removes and returns the entry with the largest radius.
    ///
    /// Ties are broken arbitrarily.
    pub fn dequeue(&mut self) -> Result<NodeIndex, TransformQueueError> {
        if self.len == 0 {
            return Err(TransformQueueError::Empty);
        }
        let top = self.nodes[1];
        let last_radius = self.radii[self.len];
        let last_node = self.nodes[self.len];
        self.len -= 1;

        let mut i = 1;
        while i * 2 <= self.len {
            let mut child = i * 2;
            if child < self.len && self.radii[child + 1] > self.radii[child] {
                child += 1;
            }
            if last_radius < self.radii[child] {
                self.radii[i] = self.radii[child];
                self.nodes[i] = self.nodes[child];
                i = child;
            } else {
                break;
            }
        }
        self.radii[i] = last_radius;
        self.nodes[i] = last_node;
        Ok(NodeIndex(top))
    }

    #[cfg(test)]
    fn is_heap_ordered(&self) -> bool {
        (2..=self.len).all(|i| self.radii[i] <= self.radii[i / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic permutation of `0..n` from a linear congruential shuffle.
    fn permutation(n: usize, seed: u64) -> Vec<usize> {
        let mut v: Vec<usize> = (0..n).collect();
        let mut state = seed;
        for i in (1..n).rev() {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let j = (state >> 33) as usize % (i + 1);
            v.swap(i, j);
        }
        v
    }

    fn drain_in_order(n: usize, seed: u64) {
        let mut q = TransformQueue::new(n);
        for i in permutation(n, seed) {
            q.enqueue(NodeIndex::new(i), i as f64 / 7.0).unwrap();
            assert!(q.is_heap_ordered(), "heap order broken after enqueue");
        }
        assert_eq!(q.len(), n);
        let mut last = f64::INFINITY;
        let mut seen = vec![false; n];
        for _ in 0..n {
            let node = q.dequeue().unwrap();
            let radius = node.index() as f64 / 7.0;
            assert!(radius <= last, "{radius} dequeued after {last}");
            assert!(q.is_heap_ordered(), "heap order broken after dequeue");
            assert!(!seen[node.index()], "{node:?} dequeued twice");
            seen[node.index()] = true;
            last = radius;
        }
        assert!(q.is_empty());
        assert_eq!(q.dequeue(), Err(TransformQueueError::Empty));
    }

    #[test]
    fn empty_queue() {
        drain_in_order(0, 1);
    }

    #[test]
    fn single_entry() {
        drain_in_order(1, 1);
    }

    #[test]
    fn thousand_entries_any_order() {
        for seed in [1, 7, 42, 1234] {
            drain_in_order(1000, seed);
        }
    }

    #[test]
    fn ascending_and_descending_insertions() {
        let mut q = TransformQueue::new(64);
        for i in 0..32 {
            q.enqueue(NodeIndex::new(i), i as f64).unwrap();
        }
        for i in (32..64).rev() {
            q.enqueue(NodeIndex::new(i), i as f64).unwrap();
        }
        let order: Vec<usize> = (0..64).map(|_| q.dequeue().unwrap().index()).collect();
        let expected: Vec<usize> = (0..64).rev().collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn overflow_is_reported() {
        let mut q = TransformQueue::new(2);
        q.enqueue(NodeIndex::new(0), 0.5).unwrap();
        q.enqueue(NodeIndex::new(1), 0.5).unwrap();
        assert_eq!(
            q.enqueue(NodeIndex::new(2), 0.1),
            Err(TransformQueueError::Overflow { capacity: 2 })
        );
    }

    #[test]
    fn infinite_radius_goes_to_the_front() {
        let mut q = TransformQueue::new(4);
        q.enqueue(NodeIndex::new(0), f64::INFINITY).unwrap();
        q.enqueue(NodeIndex::new(1), 0.5).unwrap();
        q.enqueue(NodeIndex::new(2), f64::MAX).unwrap();
        q.enqueue(NodeIndex::new(3), f64::INFINITY).unwrap();
        assert!(q.is_heap_ordered());
        let mut order: Vec<usize> = (0..4).map(|_| q.dequeue().unwrap().index()).collect();
        order[..2].sort_unstable();
        assert_eq!(order, [0, 3, 2, 1]);
    }

    #[test]
    fn clear_empties_without_reallocating() {
        let mut q = TransformQueue::new(3);
        q.enqueue(NodeIndex::new(0), 0.1).unwrap();
        q.enqueue(NodeIndex::new(1), 0.9).unwrap();
        q.clear();
        assert!(q.is_empty());
        q.enqueue(NodeIndex::new(2), 0.4).unwrap();
        assert_eq!(q.dequeue(), Ok(NodeIndex::new(2)));
        assert_eq!(q.capacity(), 3);
    }
}
