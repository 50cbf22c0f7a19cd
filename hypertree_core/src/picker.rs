// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping device positions back to nodes.
//!
//! Render loops only consult a picker while the display is at rest, and
//! reset it whenever the view starts moving, so cached device positions are
//! always those of the frame on screen.

use std::sync::Arc;

use kurbo::Point;

use crate::geometry::Transform3d;
use crate::graph::{GraphStore, NodeIndex};
use crate::render_queue::{Element, RenderQueue};

/// Device-space distance within which a click hits a node.
pub const DEFAULT_PICK_TOLERANCE: f64 = 4.0;

/// A node found under a device position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pick {
    /// The node.
    pub node: NodeIndex,
    /// Device position the node is drawn at.
    pub center: Point,
}

/// Finds nodes under device positions.
pub trait Picker {
    /// Discards cached device positions.
    fn reset(&mut self);

    /// Visible node drawn nearest to `at`, if one is within tolerance.
    fn pick_node(&mut self, object_to_device: &Transform3d, at: Point) -> Option<Pick>;

    /// Like [`pick_node`](Self::pick_node); the render loop highlights the
    /// result.
    fn highlight_node_at(&mut self, object_to_device: &Transform3d, at: Point) -> Option<Pick> {
        self.pick_node(object_to_device, at)
    }

    /// Device position of `node`, for highlighting it, if it is drawn.
    fn highlight_node(&mut self, object_to_device: &Transform3d, node: NodeIndex)
    -> Option<Point>;
}

/// A picker that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopPicker;

impl Picker for NoopPicker {
    fn reset(&mut self) {}

    fn pick_node(&mut self, _: &Transform3d, _: Point) -> Option<Pick> {
        None
    }

    fn highlight_node(&mut self, _: &Transform3d, _: NodeIndex) -> Option<Point> {
        None
    }
}

#[derive(Debug)]
enum Source {
    /// Nodes of the current render queue generation, examined
    /// incrementally as the queue grows.
    Queue {
        queue: Arc<RenderQueue>,
        examined: usize,
    },
    /// Every node of the graph.
    AllNodes { computed: bool },
}

/// Picks the visible node whose device projection is nearest to a position.
#[derive(Debug)]
pub struct NearestPicker {
    graph: Arc<GraphStore>,
    source: Source,
    tolerance: f64,
    nodes: Vec<NodeIndex>,
    points: Vec<Point>,
}

impl NearestPicker {
    /// Picker over the elements an adaptive render loop has streamed.
    #[must_use]
    pub fn adaptive(graph: Arc<GraphStore>, queue: Arc<RenderQueue>) -> Self {
        Self::with_source(graph, Source::Queue { queue, examined: 0 })
    }

    /// Picker over every node, for the nonadaptive render loop.
    #[must_use]
    pub fn nonadaptive(graph: Arc<GraphStore>) -> Self {
        Self::with_source(graph, Source::AllNodes { computed: false })
    }

    fn with_source(graph: Arc<GraphStore>, source: Source) -> Self {
        Self {
            graph,
            source,
            tolerance: DEFAULT_PICK_TOLERANCE,
            nodes: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Sets the hit distance in device units.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn project(&mut self, object_to_device: &Transform3d, node: NodeIndex) {
        let p = object_to_device.apply(self.graph.node_point(node));
        let [x, y, _] = p.affine();
        self.nodes.push(node);
        self.points.push(Point::new(x, y));
    }

    /// Brings the cache of device positions up to date.
    fn compute_points(&mut self, object_to_device: &Transform3d) {
        match &mut self.source {
            Source::Queue { queue, examined } => {
                let queue = Arc::clone(queue);
                let start = *examined;
                let end = queue.len();
                *examined = end;
                for index in start..end {
                    if let Some(Element::Node(node)) = queue.try_get(index) {
                        self.project(object_to_device, node);
                    }
                }
            }
            Source::AllNodes { computed } => {
                if !*computed {
                    *computed = true;
                    for node in self.graph.nodes() {
                        self.project(object_to_device, node);
                    }
                }
            }
        }
    }
}

impl Picker for NearestPicker {
    fn reset(&mut self) {
        self.nodes.clear();
        self.points.clear();
        match &mut self.source {
            Source::Queue { examined, .. } => *examined = 0,
            Source::AllNodes { computed } => *computed = false,
        }
    }

    fn pick_node(&mut self, object_to_device: &Transform3d, at: Point) -> Option<Pick> {
        self.compute_points(object_to_device);
        let limit = self.tolerance * self.tolerance;
        self.nodes
            .iter()
            .zip(&self.points)
            .filter(|(node, _)| self.graph.is_node_visible(**node))
            .map(|(node, point)| (*node, *point, (*point - at).hypot2()))
            .filter(|(.., d2)| *d2 <= limit)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(node, center, _)| Pick { node, center })
    }

    fn highlight_node(&mut self, object_to_device: &Transform3d, node: NodeIndex) -> Option<Point> {
        if !self.graph.is_node_visible(node) {
            return None;
        }
        self.compute_points(object_to_device);
        self.nodes
            .iter()
            .position(|n| *n == node)
            .map(|i| self.points[i])
    }
}
