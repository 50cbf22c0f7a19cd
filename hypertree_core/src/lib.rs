// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental layout and time-budgeted rendering of large graphs in
//! hyperbolic 3-space.
//!
//! `hypertree_core` draws a graph laid out in the hyperboloid model of H³,
//! seen through the projective (Klein) ball. Navigating means applying
//! hyperbolic isometries to the whole layout; for graphs with hundreds of
//! thousands of nodes that is too much work for one frame, so re-projection
//! runs on a background thread and streams its results, nearest nodes first,
//! to a render loop that draws as much as each frame's time budget allows.
//!
//! # Architecture
//!
//! ```text
//!   controlling thread
//!       │ rotate_display / translate / refresh_display (rendezvous)
//!       ▼
//!   RenderLoop thread ──── transform(m) (rendezvous) ───► Transformer thread
//!       │   ▲                                                 │
//!       │   └──── RenderQueue::get ◄── RenderQueue::add ◄─────┘
//!       ▼                                      (priority order from
//!   RenderList ──► DrawBatch ──► Canvas         TransformQueue)
//! ```
//!
//! **[`graph`]**: struct-of-arrays graph storage. Topology is fixed at
//! build time; display coordinates, radii, colors, and visibility flags can
//! be updated through a shared reference.
//!
//! **[`geometry`]**: homogeneous points, 4×4 transforms and the hyperbolic
//! isometry builders (reflection, translation, canonical orientation).
//!
//! **[`transformer`]**: the background traversal that re-projects nodes in
//! order of decreasing visual radius, fed by a
//! [`TransformQueue`](transform_queue::TransformQueue) and writing into a
//! [`RenderQueue`](render_queue::RenderQueue).
//!
//! **[`render`]**: level-of-detail classification into a
//! [`DrawBatch`](render::DrawBatch) and the time-budgeted
//! [`AdaptiveRenderer`](render::AdaptiveRenderer).
//!
//! **[`render_loop`]**: the adaptive and nonadaptive render loop state
//! machines behind one [`RenderLoop`](render_loop::RenderLoop) trait.
//!
//! **[`canvas`]**: the [`Canvas`](canvas::Canvas) trait that platform
//! integrations implement to receive draw calls.
//!
//! **[`view`]**, **[`rotation`]**, **[`picker`]**: object transform state,
//! sources of interactive rotations, and mapping device positions to nodes.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! worker-thread instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! Commands reach the worker threads through a rendezvous: the worker runs
//! freely and hands the lock to waiting requesters only at safe points, at
//! most once per unit of work, so a command is serviced within one frame or
//! one transform batch.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

pub mod canvas;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod picker;
pub mod render;
pub mod render_loop;
pub mod render_queue;
mod rendezvous;
pub mod rotation;
pub mod time;
pub mod trace;
pub mod transform_queue;
pub mod transformer;
pub mod view;
