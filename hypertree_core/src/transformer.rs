// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background re-projection of node coordinates.
//!
//! The [`Transformer`] owns a worker thread that, for every new view
//! transform, walks the graph outward from a starting node in order of
//! decreasing visual radius. Each visited node gets fresh display coordinates
//! and radius, and every node and link reached is appended to the
//! [`RenderQueue`] in batches of [`NUM_PER_ITERATION`] elements.
//!
//! Per generation the traversal is a small state machine:
//!
//! ```text
//!            ┌───────────────────────────────────────────┐
//!            ▼                                           │
//!   Node ─► ChildLink* ─► NontreeLink* ──────────────────┘
//!    │ (transform queue empty)
//!    ▼
//!   Idle ─► render queue ended
//! ```
//!
//! The starting node of the next generation is the largest-radius node seen
//! in the current one, so the region nearest the viewer is always refreshed
//! first.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::TransformQueueError;
use crate::geometry::hyperbolic::node_radius;
use crate::geometry::{Point4, Transform3d};
use crate::graph::{GraphStore, LinkIndex, NodeIndex};
use crate::render_queue::{Element, RenderQueue};
use crate::rendezvous::Rendezvous;
use crate::time::{Clock, MonotonicClock};
use crate::trace::{BatchFlushEvent, GenerationBeginEvent, GenerationEndEvent, Tracer};
use crate::transform_queue::TransformQueue;

/// Maximum elements emitted between two rendezvous points.
pub const NUM_PER_ITERATION: usize = 100;

/// A saved view: the traversal seed plus the accumulated transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Node the traversal restarts from.
    pub starting_node: NodeIndex,
    /// Accumulated view transform.
    pub transform: Transform3d,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Idle,
    Node,
    ChildLink,
    NontreeLink,
    Shutdown,
}

/// Traversal state shared with requesters through the rendezvous.
#[derive(Debug)]
struct Traversal {
    graph: Arc<GraphStore>,
    render_queue: Arc<RenderQueue>,
    transform_nontree_links: bool,

    step: Step,
    generation: u64,
    visited: Vec<u64>,
    starting_node: NodeIndex,
    starting_radius: f64,
    transform: Transform3d,
    saved: Vec<Position>,
    queue: TransformQueue,
    batch: Vec<Element>,

    link: usize,
    nontree_start: usize,
    links_end: usize,
}

impl Traversal {
    fn new(graph: Arc<GraphStore>, render_queue: Arc<RenderQueue>, nontree: bool) -> Self {
        let n = graph.num_nodes();
        Self {
            starting_node: graph.root(),
            graph,
            render_queue,
            transform_nontree_links: nontree,
            step: Step::Idle,
            generation: 0,
            visited: vec![0; n],
            starting_radius: 0.0,
            transform: Transform3d::IDENTITY,
            saved: Vec::new(),
            queue: TransformQueue::new(n),
            batch: Vec::with_capacity(NUM_PER_ITERATION),
            link: 0,
            nontree_start: 0,
            links_end: 0,
        }
    }

    /// Starts a new generation from the current seed and transform.
    fn restart(&mut self) -> Result<(), TransformQueueError> {
        if self.graph.num_nodes() == 0 {
            self.render_queue.clear();
            self.render_queue.end();
            self.step = Step::Idle;
            return Ok(());
        }
        self.generation += 1;
        self.render_queue.clear();
        self.queue.clear();
        self.batch.clear();
        self.mark_visited(self.starting_node);
        self.starting_radius = self.transform_and_enqueue(self.starting_node)?;
        self.step = Step::Node;
        Ok(())
    }

    fn reinstate(&mut self, position: Position) -> Result<(), TransformQueueError> {
        self.starting_node = position.starting_node;
        self.transform = position.transform;
        self.restart()
    }

    /// Marks `node` visited in this generation; returns whether it already was.
    fn mark_visited(&mut self, node: NodeIndex) -> bool {
        let slot = &mut self.visited[node.index()];
        let seen = *slot == self.generation;
        *slot = self.generation;
        seen
    }

    fn project(&self, node: NodeIndex) -> Point4 {
        self.transform.apply(self.graph.node_layout_point(node))
    }

    fn transform_node(&self, node: NodeIndex) -> f64 {
        let p = self.project(node);
        let radius = node_radius(p);
        self.graph.set_node_radius(node, radius);
        self.graph.set_node_point(node, p);
        radius
    }

    fn transform_and_enqueue(&mut self, node: NodeIndex) -> Result<f64, TransformQueueError> {
        let radius = self.transform_node(node);
        self.queue.enqueue(node, radius)?;
        Ok(radius)
    }

    fn visit(&mut self, node: NodeIndex) -> Result<(), TransformQueueError> {
        if !self.mark_visited(node) {
            self.transform_and_enqueue(node)?;
        }
        Ok(())
    }

    fn run_node(&mut self) -> Result<(), TransformQueueError> {
        if self.queue.is_empty() {
            self.step = Step::Idle;
            return Ok(());
        }
        let node = self.queue.dequeue()?;
        self.batch.push(Element::Node(node));

        let radius = self.graph.node_radius(node);
        if radius > self.starting_radius {
            self.starting_node = node;
            self.starting_radius = radius;
        }
        if let Some(parent) = self.graph.node_parent(node) {
            self.visit(parent)?;
        }

        let children = self.graph.child_links(node);
        let nontree = self.graph.nontree_links(node);
        self.link = self.graph.child_start(node);
        self.nontree_start = self.graph.nontree_start(node);
        self.links_end = self.graph.links_end(node);
        if !children.is_empty() {
            self.step = Step::ChildLink;
        } else if self.transform_nontree_links && !nontree.is_empty() {
            self.step = Step::NontreeLink;
        }
        Ok(())
    }

    fn run_child_link(&mut self) -> Result<(), TransformQueueError> {
        let link = LinkIndex::new(self.link);
        self.batch.push(Element::TreeLink(link));
        self.visit(self.graph.link_destination(link))?;
        self.link += 1;
        if self.link == self.nontree_start {
            self.step = if self.transform_nontree_links && self.link < self.links_end {
                Step::NontreeLink
            } else {
                Step::Node
            };
        }
        Ok(())
    }

    fn run_nontree_link(&mut self) -> Result<(), TransformQueueError> {
        let link = LinkIndex::new(self.link);
        self.batch.push(Element::NontreeLink(link));
        self.visit(self.graph.link_destination(link))?;
        self.link += 1;
        if self.link == self.links_end {
            self.step = Step::Node;
        }
        Ok(())
    }

    /// Fills `batch` with up to [`NUM_PER_ITERATION`] elements.
    fn run_batch(&mut self) -> Result<(), TransformQueueError> {
        self.batch.clear();
        while self.batch.len() < NUM_PER_ITERATION {
            match self.step {
                Step::Node => self.run_node()?,
                Step::ChildLink => self.run_child_link()?,
                Step::NontreeLink => self.run_nontree_link()?,
                Step::Idle | Step::Shutdown => break,
            }
        }
        Ok(())
    }
}

/// Handle to the background traversal thread.
///
/// Every method except [`join`](Self::join) is serviced at the worker's next
/// rendezvous point, i.e. within one batch of work.
#[derive(Debug)]
pub struct Transformer {
    shared: Arc<Rendezvous<Traversal>>,
    worker: Option<JoinHandle<()>>,
}

impl Transformer {
    /// Spawns the worker thread, which immediately starts a generation under
    /// the identity transform.
    pub fn spawn(
        graph: Arc<GraphStore>,
        render_queue: Arc<RenderQueue>,
        transform_nontree_links: bool,
        tracer: Tracer,
    ) -> io::Result<Self> {
        let shared = Arc::new(Rendezvous::new(Traversal::new(
            graph,
            render_queue,
            transform_nontree_links,
        )));
        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("hypertree-transformer".into())
                .spawn(move || run(&shared, tracer, &MonotonicClock::new()))?
        };
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Left-multiplies `m` onto the accumulated transform and restarts the
    /// traversal from the current starting node.
    pub fn transform(&self, m: &Transform3d) {
        self.shared.request(|t| {
            t.transform = *m * t.transform;
            restart_or_log(t);
        });
    }

    /// Layout point of `node` under the accumulated transform, not divided
    /// through by `w`.
    pub fn transform_node(&self, node: NodeIndex) -> Point4 {
        self.shared.request(|t| t.project(node))
    }

    /// Saves the current position on the position stack.
    pub fn push_position(&self) {
        self.shared.request(|t| {
            let position = Position {
                starting_node: t.starting_node,
                transform: t.transform,
            };
            t.saved.push(position);
        });
    }

    /// Pops the most recently saved position and restarts the traversal from
    /// it. Returns `None`, changing nothing, if no position is saved.
    pub fn pop_position(&self) -> Option<Position> {
        self.shared.request(|t| {
            let position = t.saved.pop()?;
            if let Err(e) = t.reinstate(position) {
                fail_generation(t, e);
            }
            Some(position)
        })
    }

    /// Drops the most recently saved position.
    pub fn discard_position(&self) -> Option<Position> {
        self.shared.request(|t| t.saved.pop())
    }

    /// Number of saved positions.
    pub fn saved_positions(&self) -> usize {
        self.shared.request(|t| t.saved.len())
    }

    /// Current starting node and accumulated transform.
    pub fn position(&self) -> Position {
        self.shared.request(|t| Position {
            starting_node: t.starting_node,
            transform: t.transform,
        })
    }

    /// Replaces the current position and restarts the traversal from it.
    pub fn set_position(&self, position: Position) {
        self.shared.request(|t| {
            if let Err(e) = t.reinstate(position) {
                fail_generation(t, e);
            }
        });
    }

    /// Asks the worker to exit at its next rendezvous point.
    pub fn shutdown(&self) {
        self.shared.request(|t| t.step = Step::Shutdown);
    }

    /// Shuts the worker down and waits for it to exit.
    pub fn join(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            if !worker.is_finished() {
                self.shutdown();
            }
            if worker.join().is_err() {
                tracing::error!("transformer thread panicked");
            }
        }
    }
}

impl Drop for Transformer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn fail_generation(t: &mut Traversal, e: TransformQueueError) {
    tracing::error!(error = %e, generation = t.generation, "traversal aborted");
    t.step = Step::Idle;
    t.render_queue.end();
}

fn restart_or_log(t: &mut Traversal) {
    if let Err(e) = t.restart() {
        fail_generation(t, e);
    }
}

fn run(shared: &Rendezvous<Traversal>, mut tracer: Tracer, clock: &impl Clock) {
    tracing::debug!("transformer thread started");
    let mut guard = shared.lock();
    guard.state.transform = Transform3d::IDENTITY;
    restart_or_log(&mut guard.state);

    let mut traced_generation = 0;
    let mut emitted: u32 = 0;
    loop {
        guard = shared.checkpoint(guard, |t| t.step == Step::Idle);
        let t = &mut guard.state;
        if t.step == Step::Shutdown {
            break;
        }

        if t.generation != traced_generation {
            traced_generation = t.generation;
            emitted = 0;
            tracing::trace!(generation = t.generation, "generation started");
            tracer.generation_begin(&GenerationBeginEvent {
                generation: t.generation,
                starting_node: t.starting_node.0,
                timestamp: clock.now(),
            });
        }

        if let Err(e) = t.run_batch() {
            fail_generation(t, e);
            continue;
        }

        if !t.batch.is_empty() {
            t.render_queue.add(&t.batch);
            let batch_len = u32::try_from(t.batch.len()).unwrap_or(u32::MAX);
            emitted = emitted.saturating_add(batch_len);
            tracer.batch_flush(&BatchFlushEvent {
                generation: t.generation,
                batch_len,
                queue_len: emitted,
                timestamp: clock.now(),
            });
        }

        if t.step == Step::Idle {
            t.render_queue.end();
            tracing::trace!(generation = t.generation, elements = emitted, "generation complete");
            tracer.generation_end(&GenerationEndEvent {
                generation: t.generation,
                elements: emitted,
                timestamp: clock.now(),
            });
        }
    }
    shared.close(guard);
    tracing::debug!("transformer thread exiting");
}
