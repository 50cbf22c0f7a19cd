// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The adaptive render loop.
//!
//! Coordinates come from a [`Transformer`] thread streaming into a
//! [`RenderQueue`]. Animation frames draw whatever the time budget allows;
//! once the display comes to rest the loop keeps refining into the front
//! buffer until the current generation is fully drawn.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use kurbo::Point;

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::error::GraphError;
use crate::geometry::hyperbolic::translation;
use crate::geometry::{Point4, Transform3d};
use crate::graph::{GraphStore, NodeIndex};
use crate::picker::{NearestPicker, Pick, Picker};
use crate::render::{AdaptiveRenderer, RenderList};
use crate::render_queue::RenderQueue;
use crate::rendezvous::Rendezvous;
use crate::rotation::RotationRequest;
use crate::time::Duration;
use crate::trace::FrameKind;
use crate::transformer::{Position, Transformer};
use crate::view::{DisplayPosition, ViewParameters};

use super::step::{TranslationStep, adaptive_step};
use super::{LoopState, LoopTrace, RenderLoop, Rotating, ShutdownSignal, Tracers, rotate_frame};

#[derive(Clone, Copy, Debug)]
struct Budgets {
    rotation: Duration,
    translation: Duration,
    completion: Duration,
}

/// An in-flight "fly to node" animation.
#[derive(Clone, Copy, Debug)]
struct Flight {
    /// Where the node is drawn now.
    source: Point4,
    /// Where the node was drawn when the flight began.
    initial: Point4,
    /// View before the first step. Kept here rather than on the position
    /// stack, which requesters can push and pop between frames.
    saved: Position,
}

/// Render loop state shared with requesters through the rendezvous.
struct Adaptive {
    graph: Arc<GraphStore>,
    canvas: Box<dyn Canvas + Send>,
    view: ViewParameters,
    transformer: Transformer,
    renderer: AdaptiveRenderer,
    picker: Box<dyn Picker + Send>,
    trace: LoopTrace,

    state: LoopState,
    epoch: u64,
    budgets: Budgets,
    front_buffer: bool,
    rotation: Option<Arc<dyn RotationRequest + Send + Sync>>,
    target: NodeIndex,
    flight: Option<Flight>,
    restore_requested: bool,
    pending_position: Option<DisplayPosition>,
}

impl core::fmt::Debug for Adaptive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Adaptive")
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("budgets", &self.budgets)
            .field("target", &self.target)
            .field("flight", &self.flight)
            .field("restore_requested", &self.restore_requested)
            .finish_non_exhaustive()
    }
}

impl Adaptive {
    fn is_waiting(&self) -> bool {
        self.state == LoopState::Idle && !self.restore_requested
    }

    fn is_at_rest(&self) -> bool {
        matches!(self.state, LoopState::Idle | LoopState::Complete)
    }

    /// Moves to `state` on behalf of a command.
    fn command(&mut self, state: LoopState) {
        self.state = state;
        self.epoch += 1;
    }

    fn object_to_device(&self) -> Transform3d {
        self.view.object_to_device(&self.canvas.view_transform())
    }

    fn set_front_buffer(&mut self, enabled: bool) {
        if self.front_buffer != enabled {
            self.front_buffer = enabled;
            self.canvas.set_front_buffer_rendering(enabled);
        }
    }

    /// Traces state changes. Front-buffer drawing is confined to `Complete`.
    fn observe_state(&mut self) {
        let now = self.canvas.now();
        self.trace.observe(self.state, now);
        if self.state != LoopState::Complete {
            self.set_front_buffer(false);
        }
    }

    /// Abandons an in-flight translation where it stands.
    fn abort_flight(&mut self) {
        self.flight = None;
    }

    /// Work done once when a state is entered.
    fn enter(&mut self) {
        match self.state {
            LoopState::Rotate => {
                self.renderer.reset();
                self.renderer.set_max_duration(self.budgets.rotation);
            }
            LoopState::Translate => {
                self.renderer.reset();
                self.renderer.set_max_duration(self.budgets.translation);
                let source = self.transformer.transform_node(self.target);
                self.flight = Some(Flight {
                    source,
                    initial: source,
                    saved: self.transformer.position(),
                });
            }
            LoopState::Complete => {
                self.renderer.set_max_duration(self.budgets.completion);
            }
            LoopState::Idle
            | LoopState::Refresh
            | LoopState::CompleteInit
            | LoopState::Shutdown => {}
        }
    }

    /// One unit of work in the current state. `Rotate` is driven by
    /// [`rotate_frame`] instead.
    fn step(&mut self) {
        match self.state {
            LoopState::Idle => self.apply_restore(),
            LoopState::Translate => self.flight_step(),
            LoopState::Refresh => {
                self.view.put_model_transform(&mut self.canvas);
                self.set_front_buffer(true);
                self.canvas.clear_frame();
                self.renderer.reset();
                self.state = LoopState::Complete;
            }
            LoopState::CompleteInit => {
                self.view.put_model_transform(&mut self.canvas);
                self.set_front_buffer(true);
                self.state = LoopState::Complete;
            }
            LoopState::Complete => {
                if self.renderer.is_finished() {
                    self.state = LoopState::Idle;
                } else {
                    self.refine();
                }
            }
            LoopState::Rotate | LoopState::Shutdown => {}
        }
    }

    fn apply_restore(&mut self) {
        if !self.restore_requested {
            return;
        }
        self.restore_requested = false;
        self.picker.reset();
        self.renderer.reset();
        match self.pending_position.take() {
            Some(position) => {
                self.view.set_rotation(position.rotation);
                self.transformer.set_position(Position {
                    starting_node: position.center_node,
                    transform: position.translation,
                });
            }
            None => {
                self.view.restore();
                self.transformer.pop_position();
            }
        }
        self.canvas.clear_frame();
        self.view.put_model_transform(&mut self.canvas);
        self.canvas.present_frame();
        self.state = LoopState::CompleteInit;
    }

    fn flight_step(&mut self) {
        let Some(flight) = self.flight else {
            self.state = LoopState::CompleteInit;
            return;
        };
        match adaptive_step(flight.source) {
            TranslationStep::Toward(dest) => match self.translate_frame(flight.source, dest) {
                Some(source) => self.flight = Some(Flight { source, ..flight }),
                None => {
                    self.abort_flight();
                    self.state = LoopState::CompleteInit;
                }
            },
            TranslationStep::Final => {
                // Replace the accumulated steps by one exact translation.
                self.flight = None;
                self.transformer.set_position(flight.saved);
                self.translate_frame(flight.initial, Point4::ORIGIN);
                self.state = LoopState::CompleteInit;
            }
        }
    }

    /// Translates the view so `source` lands on `dest` and draws a frame.
    /// Returns where the target node is drawn afterwards.
    fn translate_frame(&mut self, source: Point4, dest: Point4) -> Option<Point4> {
        let m = match translation(source, dest) {
            Ok(m) => m,
            Err(error) => {
                tracing::warn!(%error, node = self.target.index(), "skipping degenerate translation");
                return None;
            }
        };
        self.transformer.transform(&m);
        let moved = self.transformer.transform_node(self.target);
        self.renderer.reset();
        self.draw_frame(FrameKind::Translate);
        Some(moved)
    }

    /// Clears, draws within the current budget, and presents.
    fn draw_frame(&mut self, kind: FrameKind) {
        let mut frame = self.trace.begin_frame(kind, self.canvas.now());
        self.canvas.clear_frame();
        self.view.put_model_transform(&mut self.canvas);
        let stats = self.renderer.render(&mut self.canvas);
        self.canvas.present_frame();
        frame.add_elements(stats.elements);
        frame.set_budget_exhausted(stats.budget_exhausted);
        self.trace.end_frame(frame, self.canvas.now());
    }

    fn refine(&mut self) {
        let mut frame = self.trace.begin_frame(FrameKind::Refine, self.canvas.now());
        let stats = self.renderer.refine(&mut self.canvas);
        frame.add_elements(stats.elements);
        frame.set_budget_exhausted(stats.budget_exhausted);
        self.trace.end_frame(frame, self.canvas.now());
    }
}

impl Rotating for Adaptive {
    fn state(&self) -> LoopState {
        self.state
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn rotation_request(&self) -> Option<Arc<dyn RotationRequest + Send + Sync>> {
        self.rotation.clone()
    }

    fn apply_rotation(&mut self, delta: Option<Transform3d>) {
        match delta {
            Some(delta) => {
                self.view.extend(&delta);
                self.draw_frame(FrameKind::Rotate);
            }
            None => {
                self.rotation = None;
                self.state = LoopState::CompleteInit;
            }
        }
    }
}

fn run(shared: &Rendezvous<Adaptive>, done: &ShutdownSignal) {
    tracing::debug!("adaptive render loop started");
    let mut guard = shared.lock();
    let mut entered = None;
    loop {
        guard = shared.checkpoint(guard, Adaptive::is_waiting);
        guard.state.observe_state();
        if guard.state.state == LoopState::Shutdown {
            break;
        }
        let key = (guard.state.state, guard.state.epoch);
        if entered != Some(key) {
            entered = Some(key);
            guard.state.enter();
        }
        if guard.state.state == LoopState::Rotate {
            guard = rotate_frame(shared, guard);
        } else {
            guard.state.step();
        }
        guard.state.observe_state();
    }
    guard.state.abort_flight();
    guard.state.transformer.shutdown();
    shared.close(guard);
    done.set();
    tracing::debug!("adaptive render loop exiting");
}

/// Handle to an adaptive render loop thread and its transformer.
///
/// The loop starts by drawing the identity view. Dropping the handle shuts
/// both threads down.
#[derive(Debug)]
pub struct AdaptiveRenderLoop {
    shared: Arc<Rendezvous<Adaptive>>,
    done: Arc<ShutdownSignal>,
    worker: Option<JoinHandle<()>>,
}

impl AdaptiveRenderLoop {
    /// Spawns the transformer and render loop threads.
    pub fn spawn(
        graph: Arc<GraphStore>,
        canvas: Box<dyn Canvas + Send>,
        config: RenderConfig,
        tracers: Tracers,
    ) -> io::Result<Self> {
        let queue = Arc::new(RenderQueue::new(graph.num_nodes() + graph.num_links()));
        let transformer = Transformer::spawn(
            Arc::clone(&graph),
            Arc::clone(&queue),
            config.transform_nontree_links,
            tracers.transformer,
        )?;
        let list = RenderList::new(Arc::clone(&graph), config.render_list());
        let renderer = AdaptiveRenderer::new(Arc::clone(&queue), list);
        let picker = Box::new(NearestPicker::adaptive(Arc::clone(&graph), queue));
        let state = Adaptive {
            target: graph.root(),
            graph,
            canvas,
            view: ViewParameters::new(),
            transformer,
            renderer,
            picker,
            trace: LoopTrace::new(tracers.render_loop),
            state: LoopState::Refresh,
            epoch: 0,
            budgets: Budgets {
                rotation: config.max_rotation_duration,
                translation: config.max_translation_duration,
                completion: config.max_completion_duration,
            },
            front_buffer: false,
            rotation: None,
            flight: None,
            restore_requested: false,
            pending_position: None,
        };
        let shared = Arc::new(Rendezvous::new(state));
        let done = Arc::new(ShutdownSignal::default());
        let worker = {
            let shared = Arc::clone(&shared);
            let done = Arc::clone(&done);
            thread::Builder::new()
                .name("hypertree-render-loop".into())
                .spawn(move || run(&shared, &done))?
        };
        Ok(Self {
            shared,
            done,
            worker: Some(worker),
        })
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if !worker.is_finished() {
                self.shutdown();
            }
            if worker.join().is_err() {
                tracing::error!("render loop thread panicked");
            }
        }
    }
}

impl Drop for AdaptiveRenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl RenderLoop for AdaptiveRenderLoop {
    fn rotate_display(&self, request: Arc<dyn RotationRequest + Send + Sync>) {
        self.shared.request(|s| {
            if s.state == LoopState::Shutdown {
                return;
            }
            s.picker.reset();
            s.abort_flight();
            s.rotation = Some(request);
            s.command(LoopState::Rotate);
        });
    }

    fn translate(&self, node: NodeIndex) -> Result<(), GraphError> {
        self.shared.request(|s| {
            let num_nodes = s.graph.num_nodes();
            if node.index() >= num_nodes {
                return Err(GraphError::NodeOutOfRange {
                    node: node.index(),
                    num_nodes,
                });
            }
            if s.state != LoopState::Shutdown {
                s.picker.reset();
                s.abort_flight();
                s.target = node;
                s.command(LoopState::Translate);
            }
            Ok(())
        })
    }

    fn refresh_display(&self) {
        self.shared.request(|s| {
            if s.is_at_rest() {
                s.command(LoopState::Refresh);
            }
        });
    }

    fn resize_display(&self) {
        self.shared.request(|s| s.picker.reset());
    }

    fn pick_node(&self, at: Point) -> Option<Pick> {
        self.shared.request(|s| {
            if !s.is_at_rest() {
                return None;
            }
            let object_to_device = s.object_to_device();
            s.picker.pick_node(&object_to_device, at)
        })
    }

    fn highlight_node_at(&self, at: Point) -> Option<Pick> {
        self.shared.request(|s| {
            if !s.is_at_rest() {
                return None;
            }
            let object_to_device = s.object_to_device();
            let pick = s.picker.highlight_node_at(&object_to_device, at)?;
            s.canvas.draw_highlight(pick.center);
            Some(pick)
        })
    }

    fn highlight_node(&self, node: NodeIndex) -> bool {
        self.shared.request(|s| {
            if !s.is_at_rest() {
                return false;
            }
            let object_to_device = s.object_to_device();
            match s.picker.highlight_node(&object_to_device, node) {
                Some(at) => {
                    s.canvas.draw_highlight(at);
                    true
                }
                None => false,
            }
        })
    }

    fn save_display_position(&self) {
        self.shared.request(|s| {
            s.view.save();
            s.transformer.push_position();
        });
    }

    fn discard_display_position(&self) {
        self.shared.request(|s| {
            if !s.restore_requested {
                s.view.discard();
                s.transformer.discard_position();
            }
        });
    }

    fn restore_display_position(&self) {
        self.shared.request(|s| {
            s.restore_requested = true;
            s.pending_position = None;
        });
    }

    fn display_position(&self) -> DisplayPosition {
        self.shared.request(|s| {
            let position = s.transformer.position();
            DisplayPosition {
                center_node: position.starting_node,
                rotation: s.view.rotation(),
                translation: position.transform,
            }
        })
    }

    fn set_display_position(&self, position: DisplayPosition) {
        self.shared.request(|s| {
            s.restore_requested = true;
            s.pending_position = Some(position);
        });
    }

    fn synchronize_with_rendering(&self) {
        self.shared.request(|_| ());
    }

    fn set_max_rotation_duration(&self, max: Duration) {
        self.shared.request(|s| s.budgets.rotation = max);
    }

    fn max_rotation_duration(&self) -> Duration {
        self.shared.request(|s| s.budgets.rotation)
    }

    fn set_max_translation_duration(&self, max: Duration) {
        self.shared.request(|s| s.budgets.translation = max);
    }

    fn max_translation_duration(&self) -> Duration {
        self.shared.request(|s| s.budgets.translation)
    }

    fn set_max_completion_duration(&self, max: Duration) {
        self.shared.request(|s| s.budgets.completion = max);
    }

    fn max_completion_duration(&self) -> Duration {
        self.shared.request(|s| s.budgets.completion)
    }

    fn set_magnification(&self, magnification: f64) {
        self.shared.request(|s| {
            s.view.set_magnification(magnification);
            s.picker.reset();
            if s.is_at_rest() {
                s.command(LoopState::Refresh);
            }
        });
    }

    fn magnification(&self) -> f64 {
        self.shared.request(|s| s.view.magnification())
    }

    fn set_picker(&self, picker: Box<dyn Picker + Send>) {
        self.shared.request(|s| s.picker = picker);
    }

    fn state(&self) -> LoopState {
        self.shared.request(|s| s.state)
    }

    fn shutdown(&self) {
        self.shared.request(|s| s.state = LoopState::Shutdown);
    }

    fn wait_for_shutdown(&self) {
        self.done.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{small_graph, wait_for_state};
    use super::*;
    use crate::canvas::testing::{Call, RecordingCanvas};
    use crate::geometry::hyperbolic::vector_length;
    use crate::picker::NoopPicker;
    use crate::rotation::{InteractiveRotationRequest, RepeatingRotationRequest};

    fn config() -> RenderConfig {
        RenderConfig {
            transform_nontree_links: true,
            ..RenderConfig::unbounded()
        }
    }

    fn spawn() -> (AdaptiveRenderLoop, RecordingCanvas, Arc<GraphStore>) {
        let graph = Arc::new(small_graph());
        let canvas = RecordingCanvas::new();
        let l = AdaptiveRenderLoop::spawn(
            Arc::clone(&graph),
            Box::new(canvas.clone()),
            config(),
            Tracers::default(),
        )
        .unwrap();
        wait_for_state(&l, LoopState::Idle);
        (l, canvas, graph)
    }

    fn drawn_elements(canvas: &RecordingCanvas) -> usize {
        canvas
            .calls()
            .iter()
            .map(|c| match c {
                Call::Draw { elements } => *elements,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn initial_refresh_draws_whole_generation() {
        let (_l, canvas, graph) = spawn();
        assert_eq!(
            drawn_elements(&canvas),
            graph.num_nodes() + graph.num_links()
        );
        let buffers: Vec<_> = canvas
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::FrontBuffer(_)))
            .collect();
        assert_eq!(buffers, [Call::FrontBuffer(true), Call::FrontBuffer(false)]);
    }

    #[test]
    fn translate_centers_node() {
        let (l, canvas, graph) = spawn();
        let presents = canvas.count(|c| *c == Call::Present);
        let target = NodeIndex::new(4);
        l.translate(target).unwrap();
        wait_for_state(&l, LoopState::Idle);

        let position = l.display_position();
        let p = position.translation.apply(graph.node_layout_point(target));
        assert!(vector_length(p) < 1e-9, "target left at {p:?}");
        assert!((graph.node_radius(target) - 1.0).abs() < 1e-9);
        assert!(
            canvas.count(|c| *c == Call::Present) > presents + 1,
            "flight should take several frames"
        );
    }

    fn saved_positions(l: &AdaptiveRenderLoop) -> usize {
        l.shared.request(|s| s.transformer.saved_positions())
    }

    fn is_centered(l: &AdaptiveRenderLoop, graph: &GraphStore, node: NodeIndex) -> bool {
        let p = l
            .display_position()
            .translation
            .apply(graph.node_layout_point(node));
        vector_length(p) < 1e-9
    }

    /// Starts a flight to `node` and runs `interrupt` while the loop is held
    /// inside the flight's first frame.
    fn interrupt_flight(
        l: &AdaptiveRenderLoop,
        canvas: &RecordingCanvas,
        node: NodeIndex,
        interrupt: impl FnOnce(&AdaptiveRenderLoop) + Send,
    ) {
        // The loop blocks on the canvas log while this is held.
        let log = canvas.log.lock().unwrap();
        l.translate(node).unwrap();
        thread::scope(|scope| {
            scope.spawn(|| interrupt(l));
            while !l.shared.has_pending() {
                thread::yield_now();
            }
            drop(log);
        });
    }

    #[test]
    fn save_during_flight_keeps_flight_exact() {
        let (l, canvas, graph) = spawn();
        let target = NodeIndex::new(4);
        interrupt_flight(&l, &canvas, target, |l| {
            assert_eq!(l.state(), LoopState::Translate);
            l.save_display_position();
        });
        wait_for_state(&l, LoopState::Idle);
        assert!(is_centered(&l, &graph, target));
        assert_eq!(saved_positions(&l), 1);
    }

    #[test]
    fn discard_during_flight_drops_the_saved_position() {
        let (l, canvas, graph) = spawn();
        let target = NodeIndex::new(4);
        l.save_display_position();
        interrupt_flight(&l, &canvas, target, |l| l.discard_display_position());
        wait_for_state(&l, LoopState::Idle);
        assert!(is_centered(&l, &graph, target));
        assert_eq!(saved_positions(&l), 0);
    }

    #[test]
    fn translate_during_flight_retargets() {
        let (l, canvas, graph) = spawn();
        l.save_display_position();
        interrupt_flight(&l, &canvas, NodeIndex::new(4), |l| {
            l.translate(NodeIndex::new(2)).unwrap();
        });
        wait_for_state(&l, LoopState::Idle);
        assert!(is_centered(&l, &graph, NodeIndex::new(2)));
        assert!(!is_centered(&l, &graph, NodeIndex::new(4)));
        assert_eq!(saved_positions(&l), 1);
        assert!(l.shared.request(|s| s.flight.is_none()));
    }

    #[test]
    fn rotate_during_flight_truncates_it() {
        let (l, canvas, graph) = spawn();
        let target = NodeIndex::new(4);
        let request = Arc::new(InteractiveRotationRequest::new());
        interrupt_flight(&l, &canvas, target, |l| {
            l.rotate_display(Arc::clone(&request) as Arc<dyn RotationRequest + Send + Sync>);
        });
        request.rotate(0.2, 0.0);
        request.finish();
        wait_for_state(&l, LoopState::Idle);

        let position = l.display_position();
        assert!(position.rotation.max_abs_diff(&Transform3d::rotation_y(0.2)) < 1e-12);
        // One step was taken before the rotation cut the flight short.
        let p = position.translation.apply(graph.node_layout_point(target));
        let length = vector_length(p);
        assert!(length > 0.5 && length < 0.9, "target left at length {length}");
        assert_eq!(saved_positions(&l), 0);
        assert!(l.shared.request(|s| s.flight.is_none()));
    }

    #[test]
    fn translate_rejects_unknown_node() {
        let (l, _canvas, _graph) = spawn();
        assert!(matches!(
            l.translate(NodeIndex::new(99)),
            Err(GraphError::NodeOutOfRange { node: 99, .. })
        ));
        assert_eq!(l.state(), LoopState::Idle);
    }

    #[test]
    fn interactive_rotation_extends_view() {
        let (l, _canvas, _graph) = spawn();
        let request = Arc::new(InteractiveRotationRequest::new());
        l.rotate_display(Arc::clone(&request) as Arc<dyn RotationRequest + Send + Sync>);
        request.rotate(0.2, 0.0);
        request.finish();
        wait_for_state(&l, LoopState::Idle);
        let rotation = l.display_position().rotation;
        assert!(rotation.max_abs_diff(&Transform3d::rotation_y(0.2)) < 1e-12);
    }

    #[test]
    fn repeating_rotation_runs_until_ended() {
        let (l, canvas, _graph) = spawn();
        let request = Arc::new(RepeatingRotationRequest::new(0.0, 0.01));
        let before = canvas.count(|c| *c == Call::Present);
        l.rotate_display(Arc::clone(&request) as Arc<dyn RotationRequest + Send + Sync>);
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while canvas.count(|c| *c == Call::Present) < before + 3 {
            assert!(std::time::Instant::now() < deadline, "no rotation frames");
            thread::yield_now();
        }
        assert_eq!(l.pick_node(Point::ORIGIN), None, "picking only at rest");
        request.end();
        wait_for_state(&l, LoopState::Idle);
        let rotation = l.display_position().rotation;
        assert!(rotation.max_abs_diff(&Transform3d::IDENTITY) > 0.01);
    }

    #[test]
    fn saved_position_is_restored() {
        let (l, _canvas, _graph) = spawn();
        let home = l.display_position();
        l.save_display_position();
        l.translate(NodeIndex::new(1)).unwrap();
        wait_for_state(&l, LoopState::Idle);
        assert!(
            l.display_position()
                .translation
                .max_abs_diff(&home.translation)
                > 0.1
        );

        l.restore_display_position();
        l.synchronize_with_rendering();
        wait_for_state(&l, LoopState::Idle);
        let restored = l.display_position();
        assert!(restored.translation.max_abs_diff(&home.translation) < 1e-12);
        assert_eq!(restored.rotation, home.rotation);
    }

    #[test]
    fn set_display_position_jumps() {
        let (l, _canvas, graph) = spawn();
        let node = NodeIndex::new(1);
        let target = DisplayPosition {
            center_node: node,
            rotation: Transform3d::rotation_z(0.3),
            translation: translation(graph.node_layout_point(node), Point4::ORIGIN).unwrap(),
        };
        l.set_display_position(target);
        l.synchronize_with_rendering();
        wait_for_state(&l, LoopState::Idle);
        let position = l.display_position();
        assert_eq!(position.rotation, target.rotation);
        assert_eq!(position.translation, target.translation);
        assert_eq!(position.center_node, node);
    }

    #[test]
    fn picking_and_highlighting_at_rest() {
        let (l, canvas, _graph) = spawn();
        let pick = l.pick_node(Point::new(0.6, 0.0)).unwrap();
        assert_eq!(pick.node, NodeIndex::new(1));

        assert!(l.highlight_node(NodeIndex::new(2)));
        let highlighted = l.highlight_node_at(Point::new(0.9, 0.01)).unwrap();
        assert_eq!(highlighted.node, NodeIndex::new(4));
        let highlights: Vec<_> = canvas
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Highlight(_)))
            .collect();
        assert_eq!(
            highlights,
            [
                Call::Highlight(Point::new(0.0, 0.6)),
                Call::Highlight(Point::new(0.9, 0.0)),
            ]
        );

        l.set_picker(Box::new(NoopPicker));
        assert_eq!(l.pick_node(Point::new(0.6, 0.0)), None);
    }

    #[test]
    fn budgets_are_adjustable() {
        let (l, _canvas, _graph) = spawn();
        l.set_max_rotation_duration(Duration::from_millis(5));
        l.set_max_translation_duration(Duration::from_millis(7));
        l.set_max_completion_duration(Duration::from_millis(9));
        assert_eq!(l.max_rotation_duration(), Duration::from_millis(5));
        assert_eq!(l.max_translation_duration(), Duration::from_millis(7));
        assert_eq!(l.max_completion_duration(), Duration::from_millis(9));
    }

    #[test]
    fn magnification_triggers_refresh() {
        let (l, canvas, _graph) = spawn();
        let clears = canvas.count(|c| *c == Call::Clear);
        l.set_magnification(2.0);
        wait_for_state(&l, LoopState::Idle);
        assert_eq!(l.magnification(), 2.0);
        assert!(canvas.count(|c| *c == Call::Clear) > clears);
        assert!(canvas.calls().contains(&Call::Model(Transform3d::from_uniform_scale(2.0))));
    }

    #[test]
    fn shutdown_releases_waiters() {
        let (l, _canvas, _graph) = spawn();
        l.shutdown();
        l.wait_for_shutdown();
        assert_eq!(l.state(), LoopState::Shutdown);
        l.refresh_display();
        assert_eq!(l.state(), LoopState::Shutdown);
    }
}
