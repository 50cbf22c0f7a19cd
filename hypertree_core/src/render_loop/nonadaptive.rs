// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The nonadaptive render loop.
//!
//! Every frame transforms and draws the whole graph on the render loop
//! thread. There is no transformer and no time budget, which suits small
//! graphs and makes every frame complete.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use kurbo::Point;

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::error::GraphError;
use crate::geometry::{Point4, Transform3d};
use crate::geometry::hyperbolic::{node_radius, translation};
use crate::graph::{GraphStore, NodeIndex};
use crate::picker::{NearestPicker, Pick, Picker};
use crate::render::RenderList;
use crate::rendezvous::Rendezvous;
use crate::rotation::RotationRequest;
use crate::time::Duration;
use crate::trace::{FrameKind, Tracer};
use crate::view::{DisplayPosition, ViewParameters};

use super::step::{TranslationStep, nonadaptive_step};
use super::{LoopState, LoopTrace, RenderLoop, Rotating, ShutdownSignal, rotate_frame};

struct Nonadaptive {
    graph: Arc<GraphStore>,
    canvas: Box<dyn Canvas + Send>,
    view: ViewParameters,
    list: RenderList,
    picker: Box<dyn Picker + Send>,
    trace: LoopTrace,

    state: LoopState,
    epoch: u64,
    use_node_sizes: bool,
    rotation: Option<Arc<dyn RotationRequest + Send + Sync>>,
    target: NodeIndex,
    translation: Transform3d,
    saved: Vec<Transform3d>,
}

impl core::fmt::Debug for Nonadaptive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Nonadaptive")
            .field("state", &self.state)
            .field("epoch", &self.epoch)
            .field("target", &self.target)
            .field("saved", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl Nonadaptive {
    fn is_waiting(&self) -> bool {
        self.state == LoopState::Idle
    }

    fn command(&mut self, state: LoopState) {
        self.state = state;
        self.epoch += 1;
    }

    /// Recomputes display coordinates from the accumulated translation.
    fn place_nodes(&mut self) {
        self.graph.transform_nodes(&self.translation);
        self.picker.reset();
    }

    fn observe_state(&mut self) {
        let now = self.canvas.now();
        self.trace.observe(self.state, now);
    }

    fn step(&mut self) {
        match self.state {
            LoopState::Translate => self.translate_step(),
            LoopState::Refresh => {
                self.draw_frame(FrameKind::Refresh);
                self.state = LoopState::Idle;
            }
            LoopState::CompleteInit | LoopState::Complete => self.state = LoopState::Idle,
            LoopState::Idle | LoopState::Rotate | LoopState::Shutdown => {}
        }
    }

    fn translate_step(&mut self) {
        let source = self.graph.node_point(self.target);
        let (dest, last) = match nonadaptive_step(source) {
            TranslationStep::Toward(dest) => (dest, false),
            TranslationStep::Final => (Point4::ORIGIN, true),
        };
        match translation(source, dest) {
            Ok(m) => {
                self.translation = m * self.translation;
                self.place_nodes();
                self.draw_frame(FrameKind::Translate);
                if last {
                    self.state = LoopState::Idle;
                }
            }
            Err(error) => {
                tracing::warn!(%error, node = self.target.index(), "skipping degenerate translation");
                self.state = LoopState::Idle;
            }
        }
    }

    /// Draws every node and link under the current coordinates.
    fn draw_frame(&mut self, kind: FrameKind) {
        let mut frame = self.trace.begin_frame(kind, self.canvas.now());
        self.canvas.clear_frame();
        self.view.put_model_transform(&mut self.canvas);
        self.list.begin_frame();
        for node in self.graph.nodes() {
            if self.use_node_sizes {
                let radius = node_radius(self.graph.node_point(node));
                self.graph.set_node_radius(node, radius);
            }
            self.list.add_node(node);
            for link in self.graph.child_links(node) {
                self.list.add_tree_link(link);
            }
            for link in self.graph.nontree_links(node) {
                self.list.add_nontree_link(link);
            }
        }
        let elements = self.list.end_frame();
        self.list.render(&mut self.canvas);
        self.canvas.present_frame();
        frame.add_elements(elements);
        self.trace.end_frame(frame, self.canvas.now());
    }
}

impl Rotating for Nonadaptive {
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
                self.state = LoopState::Idle;
            }
        }
    }
}

fn run(shared: &Rendezvous<Nonadaptive>, done: &ShutdownSignal) {
    tracing::debug!("nonadaptive render loop started");
    let mut guard = shared.lock();
    loop {
        guard = shared.checkpoint(guard, Nonadaptive::is_waiting);
        guard.state.observe_state();
        if guard.state.state == LoopState::Shutdown {
            break;
        }
        if guard.state.state == LoopState::Rotate {
            guard = rotate_frame(shared, guard);
        } else {
            guard.state.step();
        }
        guard.state.observe_state();
    }
    shared.close(guard);
    done.set();
    tracing::debug!("nonadaptive render loop exiting");
}

/// Handle to a nonadaptive render loop thread.
///
/// Time budgets do not apply: the duration setters are accepted and ignored,
/// and the getters report [`Duration::MAX`].
#[derive(Debug)]
pub struct NonadaptiveRenderLoop {
    shared: Arc<Rendezvous<Nonadaptive>>,
    done: Arc<ShutdownSignal>,
    worker: Option<JoinHandle<()>>,
}

impl NonadaptiveRenderLoop {
    /// Places every node under the identity and spawns the render loop
    /// thread, which starts with a full frame.
    pub fn spawn(
        graph: Arc<GraphStore>,
        canvas: Box<dyn Canvas + Send>,
        config: RenderConfig,
        tracer: Tracer,
    ) -> io::Result<Self> {
        graph.transform_nodes(&Transform3d::IDENTITY);
        let list = RenderList::new(Arc::clone(&graph), config.render_list());
        let picker = Box::new(NearestPicker::nonadaptive(Arc::clone(&graph)));
        let state = Nonadaptive {
            target: graph.root(),
            use_node_sizes: list.config().use_node_sizes,
            graph,
            canvas,
            view: ViewParameters::new(),
            list,
            picker,
            trace: LoopTrace::new(tracer),
            state: LoopState::Refresh,
            epoch: 0,
            rotation: None,
            translation: Transform3d::IDENTITY,
            saved: Vec::new(),
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

impl Drop for NonadaptiveRenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl RenderLoop for NonadaptiveRenderLoop {
    fn rotate_display(&self, request: Arc<dyn RotationRequest + Send + Sync>) {
        self.shared.request(|s| {
            if s.state != LoopState::Shutdown {
                s.picker.reset();
                s.rotation = Some(request);
                s.command(LoopState::Rotate);
            }
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
                s.target = node;
                s.command(LoopState::Translate);
            }
            Ok(())
        })
    }

    fn refresh_display(&self) {
        self.shared.request(|s| {
            if s.state == LoopState::Idle {
                s.command(LoopState::Refresh);
            }
        });
    }

    fn resize_display(&self) {
        self.shared.request(|s| s.picker.reset());
    }

    fn pick_node(&self, at: Point) -> Option<Pick> {
        self.shared.request(|s| {
            if s.state != LoopState::Idle {
                return None;
            }
            let object_to_device = s.view.object_to_device(&s.canvas.view_transform());
            s.picker.pick_node(&object_to_device, at)
        })
    }

    fn highlight_node_at(&self, at: Point) -> Option<Pick> {
        self.shared.request(|s| {
            if s.state != LoopState::Idle {
                return None;
            }
            let object_to_device = s.view.object_to_device(&s.canvas.view_transform());
            let pick = s.picker.highlight_node_at(&object_to_device, at)?;
            s.canvas.draw_highlight(pick.center);
            Some(pick)
        })
    }

    fn highlight_node(&self, node: NodeIndex) -> bool {
        self.shared.request(|s| {
            if s.state != LoopState::Idle {
                return false;
            }
            let object_to_device = s.view.object_to_device(&s.canvas.view_transform());
            let Some(at) = s.picker.highlight_node(&object_to_device, node) else {
                return false;
            };
            s.canvas.draw_highlight(at);
            true
        })
    }

    fn save_display_position(&self) {
        self.shared.request(|s| {
            s.view.save();
            s.saved.push(s.translation);
        });
    }

    fn discard_display_position(&self) {
        self.shared.request(|s| {
            s.view.discard();
            s.saved.pop();
        });
    }

    fn restore_display_position(&self) {
        self.shared.request(|s| {
            if s.state == LoopState::Shutdown {
                return;
            }
            s.view.restore();
            if let Some(translation) = s.saved.pop() {
                s.translation = translation;
            }
            s.place_nodes();
            s.command(LoopState::Refresh);
        });
    }

    fn display_position(&self) -> DisplayPosition {
        self.shared.request(|s| DisplayPosition {
            center_node: s.target,
            rotation: s.view.rotation(),
            translation: s.translation,
        })
    }

    fn set_display_position(&self, position: DisplayPosition) {
        self.shared.request(|s| {
            if s.state == LoopState::Shutdown {
                return;
            }
            s.view.set_rotation(position.rotation);
            s.translation = position.translation;
            s.target = position.center_node;
            s.place_nodes();
            s.command(LoopState::Refresh);
        });
    }

    fn synchronize_with_rendering(&self) {
        self.shared.request(|_| ());
    }

    fn set_max_rotation_duration(&self, _: Duration) {}

    fn max_rotation_duration(&self) -> Duration {
        Duration::MAX
    }

    fn set_max_translation_duration(&self, _: Duration) {}

    fn max_translation_duration(&self) -> Duration {
        Duration::MAX
    }

    fn set_max_completion_duration(&self, _: Duration) {}

    fn max_completion_duration(&self) -> Duration {
        Duration::MAX
    }

    fn set_magnification(&self, magnification: f64) {
        self.shared.request(|s| {
            s.view.set_magnification(magnification);
            s.picker.reset();
            if s.state == LoopState::Idle {
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
    use crate::rotation::InteractiveRotationRequest;

    fn spawn() -> (NonadaptiveRenderLoop, RecordingCanvas, Arc<GraphStore>) {
        let graph = Arc::new(small_graph());
        let canvas = RecordingCanvas::new();
        let l = NonadaptiveRenderLoop::spawn(
            Arc::clone(&graph),
            Box::new(canvas.clone()),
            RenderConfig::nonadaptive(),
            Tracer::none(),
        )
        .unwrap();
        wait_for_state(&l, LoopState::Idle);
        (l, canvas, graph)
    }

    #[test]
    fn refresh_draws_whole_graph_with_inline_radii() {
        let (l, canvas, graph) = spawn();
        assert_eq!(
            canvas.calls(),
            [
                Call::Clear,
                Call::Model(Transform3d::IDENTITY),
                Call::Draw {
                    elements: graph.num_nodes() + graph.num_links()
                },
                Call::Present,
            ]
        );
        assert!((graph.node_radius(NodeIndex::new(4)) - 0.19).abs() < 1e-9);
        assert!((graph.node_radius(NodeIndex::new(0)) - 1.0).abs() < 1e-12);

        l.refresh_display();
        wait_for_state(&l, LoopState::Idle);
        assert_eq!(canvas.count(|c| *c == Call::Present), 2);
    }

    #[test]
    fn translate_centers_node() {
        let (l, canvas, graph) = spawn();
        let target = NodeIndex::new(4);
        l.translate(target).unwrap();
        wait_for_state(&l, LoopState::Idle);
        let p = graph.node_point(target);
        assert!(vector_length(p) < 1e-9, "target left at {p:?}");
        let position = l.display_position();
        assert_eq!(position.center_node, target);
        let q = position.translation.apply(graph.node_layout_point(target));
        assert!(vector_length(q) < 1e-9, "translation leaves target at {q:?}");
        assert!(canvas.count(|c| *c == Call::Present) > 2);
        assert!((graph.node_radius(target) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn restore_returns_to_saved_translation() {
        let (l, _canvas, graph) = spawn();
        l.save_display_position();
        l.translate(NodeIndex::new(1)).unwrap();
        wait_for_state(&l, LoopState::Idle);
        assert!(vector_length(graph.node_point(NodeIndex::new(1))) < 1e-9);

        l.restore_display_position();
        wait_for_state(&l, LoopState::Idle);
        assert_eq!(l.display_position().translation, Transform3d::IDENTITY);
        assert_eq!(graph.node_coordinates(NodeIndex::new(1)), [0.6, 0.0, 0.0]);
    }

    #[test]
    fn set_display_position_places_nodes() {
        let (l, _canvas, graph) = spawn();
        let node = NodeIndex::new(2);
        let position = DisplayPosition {
            center_node: node,
            rotation: Transform3d::rotation_x(0.5),
            translation: translation(graph.node_layout_point(node), Point4::ORIGIN)
                .unwrap(),
        };
        l.set_display_position(position);
        wait_for_state(&l, LoopState::Idle);
        assert_eq!(l.display_position(), position);
        assert!(vector_length(graph.node_point(node)) < 1e-9);
    }

    #[test]
    fn rotation_ends_in_idle() {
        let (l, canvas, _graph) = spawn();
        let request = Arc::new(InteractiveRotationRequest::new());
        l.rotate_display(Arc::clone(&request) as Arc<dyn RotationRequest + Send + Sync>);
        request.rotate(0.0, -0.4);
        request.finish();
        wait_for_state(&l, LoopState::Idle);
        let rotation = l.display_position().rotation;
        assert!(rotation.max_abs_diff(&Transform3d::rotation_x(-0.4)) < 1e-12);
        assert_eq!(canvas.count(|c| *c == Call::Present), 2);
    }

    #[test]
    fn pick_finds_placed_node() {
        let (l, _canvas, _graph) = spawn();
        let pick = l.pick_node(Point::new(0.0, 0.59)).unwrap();
        assert_eq!(pick.node, NodeIndex::new(2));
        assert!(l.highlight_node(NodeIndex::new(3)));
    }

    #[test]
    fn budgets_do_not_apply() {
        let (l, _canvas, _graph) = spawn();
        l.set_max_rotation_duration(Duration::from_millis(1));
        assert_eq!(l.max_rotation_duration(), Duration::MAX);
        assert_eq!(l.max_translation_duration(), Duration::MAX);
        assert_eq!(l.max_completion_duration(), Duration::MAX);
    }

    #[test]
    fn dropping_the_handle_stops_the_thread() {
        let (l, _canvas, _graph) = spawn();
        l.shutdown();
        l.wait_for_shutdown();
        assert_eq!(l.state(), LoopState::Shutdown);
        drop(l);
    }
}
