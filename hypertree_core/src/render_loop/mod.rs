// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render loop threads and their shared command surface.
//!
//! A render loop owns a [`Canvas`] and draws on its own thread. The
//! controlling thread steers it through the [`RenderLoop`] trait; every
//! command is serviced at the loop's next safe point, which while animating
//! is the end of the current frame:
//!
//! ```text
//!            rotate_display                translate
//!   ┌──────────────────────► Rotate   ┌──────────────► Translate
//!   │                          │      │                    │
//! Idle ◄───────────────┐       ▼      │                    ▼
//!   │ refresh_display  │   CompleteInit ◄────────────────────┘
//!   ▼                  │       │
//! Refresh ──────► Complete ◄───┘        (adaptive loop)
//! ```
//!
//! The nonadaptive loop has no `CompleteInit` or `Complete` states: every
//! frame it draws is already complete, so animations return straight to
//! `Idle`.
//!
//! [`RenderLoopHandle`] picks one of the two loops once, from
//! [`RenderConfig::mode`](crate::config::RenderConfig::mode).

mod adaptive;
mod nonadaptive;
mod step;

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use kurbo::Point;

use crate::canvas::Canvas;
use crate::config::{RenderConfig, RenderMode};
use crate::error::GraphError;
use crate::geometry::Transform3d;
use crate::graph::{GraphStore, NodeIndex};
use crate::picker::{Pick, Picker};
use crate::rendezvous::{Rendezvous, WorkerGuard};
use crate::rotation::RotationRequest;
use crate::time::{Duration, HostTime};
use crate::trace::{
    FrameBeginEvent, FrameEndEvent, FrameKind, FrameSummaryBuilder, StateChangeEvent, Tracer,
};
use crate::view::DisplayPosition;

pub use adaptive::AdaptiveRenderLoop;
pub use nonadaptive::NonadaptiveRenderLoop;
pub use step::{
    TRANSLATION_MIN_DELTA, TRANSLATION_STEP_DISTANCE, TRANSLATION_THRESHOLD, TranslationStep,
    adaptive_step, nonadaptive_step,
};

/// State of a render loop thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Nothing to draw; the thread sleeps until a command arrives.
    Idle,
    /// Applying deltas from a [`RotationRequest`], one frame each.
    Rotate,
    /// Flying a node to the center of the display.
    Translate,
    /// Redrawing the current view from scratch.
    Refresh,
    /// Preparing to refine after an animation (adaptive loop only).
    CompleteInit,
    /// Refining the resting display within the completion budget (adaptive
    /// loop only).
    Complete,
    /// The thread has been asked to exit.
    Shutdown,
}

/// Tracers for the threads a render loop runs.
#[derive(Debug, Default)]
pub struct Tracers {
    /// Receives state changes and frames of the render loop thread.
    pub render_loop: Tracer,
    /// Receives generations and batches of the transformer thread. Unused by
    /// the nonadaptive loop.
    pub transformer: Tracer,
}

/// Commands shared by both render loops.
///
/// All methods may be called from any thread except the render loop's own.
/// They take effect at the loop's next safe point.
pub trait RenderLoop {
    /// Starts rotating by deltas pulled from `request` until it reports the
    /// end. Interrupts any animation in progress.
    fn rotate_display(&self, request: Arc<dyn RotationRequest + Send + Sync>);

    /// Starts flying `node` to the center of the display. Interrupts any
    /// animation in progress.
    fn translate(&self, node: NodeIndex) -> Result<(), GraphError>;

    /// Redraws the display if it is at rest.
    fn refresh_display(&self);

    /// Tells the loop the canvas changed size.
    fn resize_display(&self);

    /// The visible node drawn nearest to device position `at`, while at rest.
    fn pick_node(&self, at: Point) -> Option<Pick>;

    /// Picks like [`pick_node`](Self::pick_node) and highlights the result.
    fn highlight_node_at(&self, at: Point) -> Option<Pick>;

    /// Highlights `node`. Returns whether it is drawn.
    fn highlight_node(&self, node: NodeIndex) -> bool;

    /// Saves the current view on the position stack.
    fn save_display_position(&self);

    /// Drops the most recently saved view.
    fn discard_display_position(&self);

    /// Returns to the most recently saved view, dropping it from the stack.
    fn restore_display_position(&self);

    /// The current view.
    fn display_position(&self) -> DisplayPosition;

    /// Jumps to `position`.
    fn set_display_position(&self, position: DisplayPosition);

    /// Blocks until the loop reaches its next safe point.
    fn synchronize_with_rendering(&self);

    /// Sets the per-frame time budget while rotating.
    fn set_max_rotation_duration(&self, max: Duration);

    /// Per-frame time budget while rotating.
    fn max_rotation_duration(&self) -> Duration;

    /// Sets the per-frame time budget while translating.
    fn set_max_translation_duration(&self, max: Duration);

    /// Per-frame time budget while translating.
    fn max_translation_duration(&self) -> Duration;

    /// Sets the time budget of each refinement pass.
    fn set_max_completion_duration(&self, max: Duration);

    /// Time budget of each refinement pass.
    fn max_completion_duration(&self) -> Duration;

    /// Sets the magnification and redraws.
    fn set_magnification(&self, magnification: f64);

    /// Current magnification.
    fn magnification(&self) -> f64;

    /// Replaces the picker.
    fn set_picker(&self, picker: Box<dyn Picker + Send>);

    /// Current state.
    fn state(&self) -> LoopState;

    /// Asks the loop to exit at its next safe point.
    fn shutdown(&self);

    /// Blocks until the loop thread has exited.
    fn wait_for_shutdown(&self);
}

/// The render loop selected by a [`RenderConfig`].
#[derive(Debug)]
pub enum RenderLoopHandle {
    /// Incremental, time-budgeted rendering fed by a transformer thread.
    Adaptive(AdaptiveRenderLoop),
    /// Whole-graph rendering on the render loop thread.
    Nonadaptive(NonadaptiveRenderLoop),
}

impl RenderLoopHandle {
    /// Spawns the loop `config.mode` asks for.
    pub fn spawn(
        graph: Arc<GraphStore>,
        canvas: Box<dyn Canvas + Send>,
        config: RenderConfig,
        tracers: Tracers,
    ) -> io::Result<Self> {
        Ok(match config.mode {
            RenderMode::Adaptive => {
                Self::Adaptive(AdaptiveRenderLoop::spawn(graph, canvas, config, tracers)?)
            }
            RenderMode::Nonadaptive => Self::Nonadaptive(NonadaptiveRenderLoop::spawn(
                graph,
                canvas,
                config,
                tracers.render_loop,
            )?),
        })
    }

    fn inner(&self) -> &dyn RenderLoop {
        match self {
            Self::Adaptive(l) => l,
            Self::Nonadaptive(l) => l,
        }
    }
}

impl RenderLoop for RenderLoopHandle {
    fn rotate_display(&self, request: Arc<dyn RotationRequest + Send + Sync>) {
        self.inner().rotate_display(request);
    }

    fn translate(&self, node: NodeIndex) -> Result<(), GraphError> {
        self.inner().translate(node)
    }

    fn refresh_display(&self) {
        self.inner().refresh_display();
    }

    fn resize_display(&self) {
        self.inner().resize_display();
    }

    fn pick_node(&self, at: Point) -> Option<Pick> {
        self.inner().pick_node(at)
    }

    fn highlight_node_at(&self, at: Point) -> Option<Pick> {
        self.inner().highlight_node_at(at)
    }

    fn highlight_node(&self, node: NodeIndex) -> bool {
        self.inner().highlight_node(node)
    }

    fn save_display_position(&self) {
        self.inner().save_display_position();
    }

    fn discard_display_position(&self) {
        self.inner().discard_display_position();
    }

    fn restore_display_position(&self) {
        self.inner().restore_display_position();
    }

    fn display_position(&self) -> DisplayPosition {
        self.inner().display_position()
    }

    fn set_display_position(&self, position: DisplayPosition) {
        self.inner().set_display_position(position);
    }

    fn synchronize_with_rendering(&self) {
        self.inner().synchronize_with_rendering();
    }

    fn set_max_rotation_duration(&self, max: Duration) {
        self.inner().set_max_rotation_duration(max);
    }

    fn max_rotation_duration(&self) -> Duration {
        self.inner().max_rotation_duration()
    }

    fn set_max_translation_duration(&self, max: Duration) {
        self.inner().set_max_translation_duration(max);
    }

    fn max_translation_duration(&self) -> Duration {
        self.inner().max_translation_duration()
    }

    fn set_max_completion_duration(&self, max: Duration) {
        self.inner().set_max_completion_duration(max);
    }

    fn max_completion_duration(&self) -> Duration {
        self.inner().max_completion_duration()
    }

    fn set_magnification(&self, magnification: f64) {
        self.inner().set_magnification(magnification);
    }

    fn magnification(&self) -> f64 {
        self.inner().magnification()
    }

    fn set_picker(&self, picker: Box<dyn Picker + Send>) {
        self.inner().set_picker(picker);
    }

    fn state(&self) -> LoopState {
        self.inner().state()
    }

    fn shutdown(&self) {
        self.inner().shutdown();
    }

    fn wait_for_shutdown(&self) {
        self.inner().wait_for_shutdown();
    }
}

/// Set once by a loop thread on exit.
#[derive(Debug, Default)]
pub(crate) struct ShutdownSignal {
    done: Mutex<bool>,
    changed: Condvar,
}

impl ShutdownSignal {
    pub(crate) fn set(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.changed.notify_all();
    }

    pub(crate) fn wait(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .changed
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// State-change and frame instrumentation of a loop thread.
#[derive(Debug)]
pub(crate) struct LoopTrace {
    tracer: Tracer,
    state: LoopState,
    next_frame: u64,
}

impl LoopTrace {
    pub(crate) fn new(tracer: Tracer) -> Self {
        Self {
            tracer,
            state: LoopState::Idle,
            next_frame: 0,
        }
    }

    /// Records a transition to `to`, returning the previous state if it
    /// differs.
    pub(crate) fn observe(&mut self, to: LoopState, now: HostTime) -> Option<LoopState> {
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        tracing::debug!(?from, ?to, "render loop state change");
        self.tracer.state_change(&StateChangeEvent {
            from,
            to,
            timestamp: now,
        });
        Some(from)
    }

    pub(crate) fn begin_frame(&mut self, kind: FrameKind, now: HostTime) -> FrameSummaryBuilder {
        let frame_index = self.next_frame;
        self.next_frame += 1;
        self.tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            kind,
            timestamp: now,
        });
        FrameSummaryBuilder::new(frame_index, kind, now)
    }

    pub(crate) fn end_frame(&mut self, frame: FrameSummaryBuilder, now: HostTime) {
        let summary = frame.finish(now);
        self.tracer.frame_end(&FrameEndEvent {
            frame_index: summary.frame_index,
            timestamp: now,
        });
        self.tracer.frame_summary(&summary);
    }
}

/// Loop state that can be driven through `Rotate` frames.
pub(crate) trait Rotating {
    fn state(&self) -> LoopState;

    /// Bumped by every command that (re)enters a state.
    fn epoch(&self) -> u64;

    fn rotation_request(&self) -> Option<Arc<dyn RotationRequest + Send + Sync>>;

    /// Draws a frame for `delta`, or leaves `Rotate` when it is `None`.
    fn apply_rotation(&mut self, delta: Option<Transform3d>);
}

/// One `Rotate` step. The rotation request may block, so it is polled with
/// the lock released; a command that arrives meanwhile wins.
pub(crate) fn rotate_frame<'a, S: Rotating>(
    shared: &'a Rendezvous<S>,
    guard: WorkerGuard<'a, S>,
) -> WorkerGuard<'a, S> {
    let Some(request) = guard.state.rotation_request() else {
        let mut guard = guard;
        guard.state.apply_rotation(None);
        return guard;
    };
    let epoch = guard.state.epoch();
    let (mut guard, delta) = shared.unlocked(guard, || request.get_rotation());
    if guard.state.state() == LoopState::Rotate && guard.state.epoch() == epoch {
        guard.state.apply_rotation(delta);
    }
    guard
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving loop threads in tests.

    use std::thread;
    use std::time::{Duration, Instant};

    use super::{LoopState, RenderLoop};
    use crate::geometry::Point4;
    use crate::graph::{GraphBuilder, GraphStore, NodeIndex};

    /// Root with three children on the axes and one grandchild, plus a
    /// non-tree link between two children.
    pub(crate) fn small_graph() -> GraphStore {
        let mut b = GraphBuilder::new(5, 5);
        b.set_root(NodeIndex::new(0)).unwrap();
        let points = [
            Point4::ORIGIN,
            Point4::from_affine(0.6, 0.0, 0.0),
            Point4::from_affine(0.0, 0.6, 0.0),
            Point4::from_affine(0.0, 0.0, 0.6),
            Point4::from_affine(0.9, 0.0, 0.0),
        ];
        for (i, p) in points.into_iter().enumerate() {
            b.set_node_layout(NodeIndex::new(i), p).unwrap();
        }
        let mut l = b.links(NodeIndex::new(0)).unwrap();
        l.add_child(NodeIndex::new(1), 0).unwrap();
        l.add_child(NodeIndex::new(2), 1).unwrap();
        l.add_child(NodeIndex::new(3), 2).unwrap();
        l.end();
        let mut l = b.links(NodeIndex::new(1)).unwrap();
        l.add_child(NodeIndex::new(4), 3).unwrap();
        let mut l = l.nontree();
        l.add_nontree(NodeIndex::new(2), 4).unwrap();
        l.end();
        b.build().unwrap()
    }

    /// Polls until the loop reports `state`.
    pub(crate) fn wait_for_state(l: &impl RenderLoop, state: LoopState) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while l.state() != state {
            assert!(Instant::now() < deadline, "loop never reached {state:?}");
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{small_graph, wait_for_state};
    use super::*;
    use crate::canvas::testing::RecordingCanvas;

    fn spawn(config: RenderConfig) -> RenderLoopHandle {
        let graph = Arc::new(small_graph());
        let l = RenderLoopHandle::spawn(
            graph,
            Box::new(RecordingCanvas::new()),
            config,
            Tracers::default(),
        )
        .unwrap();
        wait_for_state(&l, LoopState::Idle);
        l
    }

    #[test]
    fn mode_selects_loop() {
        let adaptive = spawn(RenderConfig::interactive());
        assert!(matches!(adaptive, RenderLoopHandle::Adaptive(_)));
        assert_eq!(
            adaptive.max_rotation_duration(),
            RenderConfig::interactive().max_rotation_duration
        );

        let nonadaptive = spawn(RenderConfig::nonadaptive());
        assert!(matches!(nonadaptive, RenderLoopHandle::Nonadaptive(_)));
    }

    #[test]
    fn handle_delegates_commands() {
        for config in [RenderConfig::unbounded(), RenderConfig::nonadaptive()] {
            let l = spawn(config);
            l.translate(NodeIndex::new(3)).unwrap();
            wait_for_state(&l, LoopState::Idle);
            let position = l.display_position();
            assert_eq!(position.center_node, NodeIndex::new(3), "{config:?}");
            l.shutdown();
            l.wait_for_shutdown();
        }
    }

    #[test]
    fn shutdown_signal_wakes_waiters() {
        let signal = Arc::new(ShutdownSignal::default());
        std::thread::scope(|s| {
            let waiter = s.spawn(|| signal.wait());
            signal.set();
            waiter.join().unwrap();
        });
        signal.wait();
    }
}
