// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-budgeted drawing of a render queue generation.

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::render_queue::RenderQueue;
use crate::time::{Duration, HostTime};

use super::list::RenderList;

/// Elements drawn between two budget checks.
pub const CHUNK_SIZE: usize = 25;

/// Outcome of one [`AdaptiveRenderer::render`] or
/// [`AdaptiveRenderer::refine`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Elements handed to the render list, including redrawn ones.
    pub elements: usize,
    /// Whether drawing stopped because the time budget ran out.
    pub budget_exhausted: bool,
}

/// Draws the current [`RenderQueue`] generation incrementally.
///
/// The renderer remembers how many queue elements it has displayed. A full
/// [`render`](Self::render) redraws those and then continues; a
/// [`refine`](Self::refine) only continues, drawing on top of what is
/// already on screen. Either way new elements are taken in chunks of
/// [`CHUNK_SIZE`] until the generation is exhausted or the time budget runs
/// out. At least one chunk is drawn per call.
#[derive(Debug)]
pub struct AdaptiveRenderer {
    queue: Arc<RenderQueue>,
    list: RenderList,
    displayed: usize,
    finished: bool,
    max_duration: Duration,
}

impl AdaptiveRenderer {
    /// Creates a renderer with an unbounded time budget.
    #[must_use]
    pub fn new(queue: Arc<RenderQueue>, list: RenderList) -> Self {
        Self {
            queue,
            list,
            displayed: 0,
            finished: false,
            max_duration: Duration::MAX,
        }
    }

    /// Forgets everything displayed; the next call starts at the first
    /// element of the current generation.
    pub fn reset(&mut self) {
        self.displayed = 0;
        self.finished = false;
    }

    /// Sets the time budget of each call.
    pub fn set_max_duration(&mut self, max: Duration) {
        self.max_duration = max;
    }

    /// Current time budget.
    #[must_use]
    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Number of queue elements drawn so far.
    #[must_use]
    pub fn displayed(&self) -> usize {
        self.displayed
    }

    /// Whether every element of a completed generation has been drawn.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Redraws the displayed elements, then continues within the budget.
    pub fn render(&mut self, canvas: &mut impl Canvas) -> RenderStats {
        let start = canvas.now();
        self.list.begin_frame();
        let mut redrawn = 0;
        for index in 0..self.displayed {
            if let Some(element) = self.queue.try_get(index) {
                self.list.add(element);
                redrawn += 1;
            }
        }
        self.list.end_frame();
        self.list.render(canvas);

        let mut stats = self.continue_display(canvas, start);
        stats.elements += redrawn;
        stats
    }

    /// Continues drawing where the last call stopped.
    pub fn refine(&mut self, canvas: &mut impl Canvas) -> RenderStats {
        let start = canvas.now();
        self.continue_display(canvas, start)
    }

    fn continue_display(&mut self, canvas: &mut impl Canvas, start: HostTime) -> RenderStats {
        let mut stats = RenderStats::default();
        while !self.finished {
            self.list.begin_frame();
            let mut added = 0;
            while added < CHUNK_SIZE {
                match self.queue.get(self.displayed) {
                    Some(element) => {
                        self.list.add(element);
                        self.displayed += 1;
                        added += 1;
                    }
                    None => {
                        self.finished = true;
                        break;
                    }
                }
            }
            self.list.end_frame();
            self.list.render(canvas);
            stats.elements += added;

            if !self.finished && canvas.now().exceeds(start, self.max_duration) {
                stats.budget_exhausted = true;
                break;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::{Call, RecordingCanvas};
    use crate::geometry::Transform3d;
    use crate::graph::{GraphBuilder, GraphStore, NodeIndex};
    use crate::render::RenderListConfig;
    use crate::render_queue::Element;

    /// A star of `n` nodes, every element queued and the generation ended.
    fn setup(n: usize) -> (Arc<GraphStore>, Arc<RenderQueue>) {
        let mut b = GraphBuilder::new(n, n - 1);
        b.set_root(NodeIndex::new(0)).unwrap();
        let mut l = b.links(NodeIndex::new(0)).unwrap();
        for i in 1..n {
            l.add_child(NodeIndex::new(i), 0).unwrap();
        }
        l.end();
        let graph = Arc::new(b.build().unwrap());
        graph.transform_nodes(&Transform3d::IDENTITY);
        let queue = Arc::new(RenderQueue::new(n));
        let nodes: Vec<_> = (0..n).map(|i| Element::Node(NodeIndex::new(i))).collect();
        queue.add(&nodes);
        queue.end();
        (graph, queue)
    }

    fn renderer(graph: &Arc<GraphStore>, queue: &Arc<RenderQueue>) -> AdaptiveRenderer {
        let list = RenderList::new(Arc::clone(graph), RenderListConfig::default());
        AdaptiveRenderer::new(Arc::clone(queue), list)
    }

    #[test]
    fn unbounded_budget_draws_everything_in_chunks() {
        let (graph, queue) = setup(60);
        let mut r = renderer(&graph, &queue);
        let mut canvas = RecordingCanvas::new();
        let stats = r.refine(&mut canvas);
        assert_eq!(
            stats,
            RenderStats {
                elements: 60,
                budget_exhausted: false
            }
        );
        assert!(r.is_finished());
        let draws: Vec<_> = canvas
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Draw { elements } => Some(elements),
                _ => None,
            })
            .collect();
        assert_eq!(draws, [25, 25, 10]);
    }

    #[test]
    fn zero_budget_draws_one_chunk_per_call() {
        let (graph, queue) = setup(60);
        let mut r = renderer(&graph, &queue);
        r.set_max_duration(Duration::ZERO);
        let mut canvas = RecordingCanvas::new();
        let first = r.refine(&mut canvas);
        assert_eq!(first.elements, CHUNK_SIZE);
        assert!(first.budget_exhausted);
        assert!(!r.is_finished());
        r.refine(&mut canvas);
        r.refine(&mut canvas);
        assert_eq!(r.displayed(), 60);
        assert!(r.is_finished());
    }

    #[test]
    fn render_redraws_what_was_displayed() {
        let (graph, queue) = setup(30);
        let mut r = renderer(&graph, &queue);
        r.set_max_duration(Duration::ZERO);
        let mut canvas = RecordingCanvas::new();
        r.refine(&mut canvas);
        assert_eq!(r.displayed(), 25);

        let mut frame = RecordingCanvas::new();
        let stats = r.render(&mut frame);
        // 25 redrawn plus the remaining 5.
        assert_eq!(stats.elements, 30);
        assert_eq!(frame.log.lock().unwrap().drawn_nodes, 30);
        assert!(r.is_finished());
    }

    #[test]
    fn reset_starts_over() {
        let (graph, queue) = setup(10);
        let mut r = renderer(&graph, &queue);
        let mut canvas = RecordingCanvas::new();
        r.refine(&mut canvas);
        assert!(r.is_finished());
        r.reset();
        assert!(!r.is_finished());
        assert_eq!(r.displayed(), 0);
        assert_eq!(r.refine(&mut canvas).elements, 10);
    }

    #[test]
    fn finished_renderer_draws_nothing_new() {
        let (graph, queue) = setup(3);
        let mut r = renderer(&graph, &queue);
        let mut canvas = RecordingCanvas::new();
        r.refine(&mut canvas);
        assert_eq!(r.refine(&mut canvas), RenderStats::default());
    }
}
