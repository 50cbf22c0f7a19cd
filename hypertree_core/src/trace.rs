// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the transformer and render loops.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! worker threads call at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] owns an optional boxed sink and lives on the worker thread that
//! emits into it. When the `trace` feature is **off**, every `Tracer` method
//! compiles to nothing. When **on**, each method performs a single `Option`
//! branch before dispatching.
//!
//! A sink shared with the controlling thread can be wrapped in
//! `Arc<Mutex<_>>`, which itself implements [`TraceSink`].
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use std::sync::{Arc, Mutex, PoisonError};

use crate::render_loop::LoopState;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What a render-loop frame was drawn for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// One step of an interactive rotation.
    Rotate,
    /// One step of a fly-to-node animation.
    Translate,
    /// A full redraw after a refresh or restore.
    Refresh,
    /// An incremental refinement pass of the adaptive renderer.
    Refine,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the transformer starts a traversal generation.
#[derive(Clone, Copy, Debug)]
pub struct GenerationBeginEvent {
    /// Monotonic generation counter.
    pub generation: u64,
    /// Node the traversal is seeded from.
    pub starting_node: u32,
    /// Host time when the generation started.
    pub timestamp: HostTime,
}

/// Emitted when a generation's traversal queue runs dry.
#[derive(Clone, Copy, Debug)]
pub struct GenerationEndEvent {
    /// Generation counter.
    pub generation: u64,
    /// Total elements written to the render queue.
    pub elements: u32,
    /// Host time when the generation ended.
    pub timestamp: HostTime,
}

/// Emitted each time the transformer flushes a batch to the render queue.
#[derive(Clone, Copy, Debug)]
pub struct BatchFlushEvent {
    /// Generation counter.
    pub generation: u64,
    /// Elements in this batch.
    pub batch_len: u32,
    /// Elements in the render queue after the flush.
    pub queue_len: u32,
    /// Host time of the flush.
    pub timestamp: HostTime,
}

/// Emitted when a render loop changes state.
#[derive(Clone, Copy, Debug)]
pub struct StateChangeEvent {
    /// State being left.
    pub from: LoopState,
    /// State being entered.
    pub to: LoopState,
    /// Host time of the transition.
    pub timestamp: HostTime,
}

/// Marks the beginning of a render-loop frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Why the frame is drawn.
    pub kind: FrameKind,
    /// Host time at the start of the frame.
    pub timestamp: HostTime,
}

/// Marks the end of a render-loop frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time at the end of the frame.
    pub timestamp: HostTime,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Why the frame was drawn.
    pub kind: FrameKind,
    /// Host time at the start of the frame.
    pub begin: HostTime,
    /// Frame duration in nanoseconds.
    pub duration_nanos: u64,
    /// Elements handed to the canvas.
    pub elements_drawn: u32,
    /// Whether drawing stopped because the time budget ran out.
    pub budget_exhausted: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the transformer and render loops.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a traversal generation starts.
    fn on_generation_begin(&mut self, e: &GenerationBeginEvent) {
        _ = e;
    }

    /// Called when a traversal generation ends.
    fn on_generation_end(&mut self, e: &GenerationEndEvent) {
        _ = e;
    }

    /// Called when a batch is flushed to the render queue.
    fn on_batch_flush(&mut self, e: &BatchFlushEvent) {
        _ = e;
    }

    /// Called on each render-loop state transition.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame.
    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Arc<Mutex<S>> {
    fn on_generation_begin(&mut self, e: &GenerationBeginEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_generation_begin(e);
    }

    fn on_generation_end(&mut self, e: &GenerationEndEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_generation_end(e);
    }

    fn on_batch_flush(&mut self, e: &BatchFlushEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_batch_flush(e);
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_state_change(e);
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_frame_begin(e);
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_frame_end(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_frame_summary(s);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// A boxed sink that can move to a worker thread.
pub type BoxedSink = Box<dyn TraceSink + Send>;

/// Thin wrapper around an optional owned [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing and
/// the sink passed to [`Tracer::new`] is dropped immediately. When **on**,
/// each method checks the inner `Option` (one branch) before dispatching.
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<BoxedSink>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::none()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: BoxedSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            drop(sink);
            Self {}
        }
    }

    /// Creates a tracer from an optional sink.
    #[inline]
    #[must_use]
    pub fn from_option(sink: Option<BoxedSink>) -> Self {
        match sink {
            Some(sink) => Self::new(sink),
            None => Self::none(),
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {}
        }
    }

    /// Emits a [`GenerationBeginEvent`].
    #[inline]
    pub fn generation_begin(&mut self, e: &GenerationBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_generation_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`GenerationEndEvent`].
    #[inline]
    pub fn generation_end(&mut self, e: &GenerationEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_generation_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BatchFlushEvent`].
    #[inline]
    pub fn batch_flush(&mut self, e: &BatchFlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_batch_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StateChangeEvent`].
    #[inline]
    pub fn state_change(&mut self, e: &StateChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_state_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameEndEvent`].
    #[inline]
    pub fn frame_end(&mut self, e: &FrameEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Accumulates drawing statistics during a frame and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    kind: FrameKind,
    begin: HostTime,
    elements_drawn: u32,
    budget_exhausted: bool,
}

impl FrameSummaryBuilder {
    /// Starts a summary for a frame that began at `begin`.
    #[must_use]
    pub fn new(frame_index: u64, kind: FrameKind, begin: HostTime) -> Self {
        Self {
            frame_index,
            kind,
            begin,
            elements_drawn: 0,
            budget_exhausted: false,
        }
    }

    /// Adds to the count of elements drawn.
    pub fn add_elements(&mut self, n: usize) {
        self.elements_drawn = self
            .elements_drawn
            .saturating_add(u32::try_from(n).unwrap_or(u32::MAX));
    }

    /// Records that drawing stopped on the time budget.
    pub fn set_budget_exhausted(&mut self, exhausted: bool) {
        self.budget_exhausted = exhausted;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self, end: HostTime) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            kind: self.kind,
            begin: self.begin,
            duration_nanos: end.saturating_duration_since(self.begin).nanos(),
            elements_drawn: self.elements_drawn,
            budget_exhausted: self.budget_exhausted,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
