// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry preparation for a [`Canvas`](crate::canvas::Canvas).
//!
//! [`RenderList`] turns visible nodes and links into a [`DrawBatch`],
//! sorting nodes into three levels of detail by radius.
//! [`AdaptiveRenderer`] feeds it from a
//! [`RenderQueue`](crate::render_queue::RenderQueue) under a time budget.

mod adaptive;
mod batch;
mod list;

pub use adaptive::{AdaptiveRenderer, CHUNK_SIZE, RenderStats};
pub use batch::{
    Detail, DrawBatch, FAR_NODES_THRESHOLD, LineSet, MIDDLE_NODES_THRESHOLD, PointSet,
};
pub use list::{RenderList, RenderListConfig};
