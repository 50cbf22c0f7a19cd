// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

use crate::graph::NodeIndex;

/// Precondition violations in the hyperbolic transform builders.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GeometryError {
    /// A reflection center has a zero Minkowski self inner product.
    #[error("reflection center has zero Minkowski inner product")]
    ZeroInnerProduct,
    /// Both anchors of a canonical orientation are the origin.
    #[error("canonical orientation anchors are both at the origin")]
    BothAtOrigin,
    /// The computation produced NaN or infinite matrix entries.
    #[error("transform has non-finite entries")]
    NonFinite,
}

/// Capacity violations in the traversal priority queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TransformQueueError {
    /// More entries were enqueued than the queue was sized for.
    #[error("transform queue overflow (capacity {capacity})")]
    Overflow {
        /// The fixed capacity of the queue.
        capacity: usize,
    },
    /// `dequeue` was called on an empty queue.
    #[error("transform queue is empty")]
    Empty,
}

/// Graph construction errors reported by [`GraphBuilder`](crate::graph::GraphBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A node index was outside `0..num_nodes`.
    #[error("node {node} out of range (num_nodes {num_nodes})")]
    NodeOutOfRange {
        /// The offending index.
        node: usize,
        /// The declared node count.
        num_nodes: usize,
    },
    /// A node's link range was populated more than once.
    #[error("links of {0:?} were already populated")]
    LinksAlreadyPopulated(NodeIndex),
    /// More links were added than were declared.
    #[error("link capacity {capacity} exceeded")]
    LinkCapacityExceeded {
        /// The declared link count.
        capacity: usize,
    },
    /// `build` was called before a root node was designated.
    #[error("no root node was set")]
    MissingRoot,
    /// `build` was called with fewer links than declared.
    #[error("declared {declared} links but only {added} were added")]
    MissingLinks {
        /// The declared link count.
        declared: usize,
        /// The number of links actually added.
        added: usize,
    },
}
