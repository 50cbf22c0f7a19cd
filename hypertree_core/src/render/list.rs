// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collects visible elements into a [`DrawBatch`].

use std::sync::Arc;

use crate::canvas::Canvas;
use crate::graph::{GraphStore, LinkIndex, NodeIndex};
use crate::render_queue::Element;

use super::batch::{Detail, DrawBatch, LineSet};

/// Which element classes a [`RenderList`] draws, and whether it colors them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderListConfig {
    /// Classify nodes into near/middle/far by radius.
    pub use_node_sizes: bool,
    /// Draw nodes.
    pub include_nodes: bool,
    /// Attach node colors.
    pub include_node_colors: bool,
    /// Draw tree links.
    pub include_tree_links: bool,
    /// Attach tree link colors.
    pub include_tree_link_colors: bool,
    /// Draw non-tree links.
    pub include_nontree_links: bool,
    /// Attach non-tree link colors.
    pub include_nontree_link_colors: bool,
}

impl RenderListConfig {
    /// Draws every element class, with or without colors.
    #[must_use]
    pub const fn new(use_node_sizes: bool, include_colors: bool) -> Self {
        Self {
            use_node_sizes,
            include_nodes: true,
            include_node_colors: include_colors,
            include_tree_links: true,
            include_tree_link_colors: include_colors,
            include_nontree_links: true,
            include_nontree_link_colors: include_colors,
        }
    }
}

impl Default for RenderListConfig {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Per-frame accumulator of visible geometry.
///
/// Elements are added between [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame) and drawn with [`render`](Self::render).
/// A link is drawn whenever the link itself is visible, even if one of its
/// endpoints is hidden.
#[derive(Debug)]
pub struct RenderList {
    graph: Arc<GraphStore>,
    config: RenderListConfig,
    batch: DrawBatch,
}

impl RenderList {
    /// Creates a render list for `graph`.
    ///
    /// Non-tree links are never drawn for a graph that has none.
    #[must_use]
    pub fn new(graph: Arc<GraphStore>, mut config: RenderListConfig) -> Self {
        config.include_nontree_links &= graph.num_nontree_links() > 0;
        config.include_nontree_link_colors &= config.include_nontree_links;
        config.include_tree_link_colors &= config.include_tree_links;
        config.include_node_colors &= config.include_nodes;
        Self {
            graph,
            config,
            batch: DrawBatch::new(),
        }
    }

    /// Effective configuration after adjusting for the graph.
    #[must_use]
    pub fn config(&self) -> RenderListConfig {
        self.config
    }

    /// Discards the previous frame's geometry.
    pub fn begin_frame(&mut self) {
        self.batch.clear();
    }

    /// Closes the frame, returning the number of points and segments in it.
    pub fn end_frame(&mut self) -> usize {
        self.batch.len()
    }

    /// Adds `node` if it is visible.
    pub fn add_node(&mut self, node: NodeIndex) {
        if !self.config.include_nodes || !self.graph.is_node_visible(node) {
            return;
        }
        let detail = if self.config.use_node_sizes {
            Detail::from_radius(self.graph.node_radius(node))
        } else {
            Detail::Near
        };
        let position = self.graph.node_coordinates(node);
        let color = self.graph.node_color(node);
        let points = self.batch.points_mut(detail);
        points.positions.push(position);
        if self.config.include_node_colors {
            points.colors.push(color);
        }
    }

    /// Adds a tree link if it is visible.
    pub fn add_tree_link(&mut self, link: LinkIndex) {
        if self.config.include_tree_links {
            let colored = self.config.include_tree_link_colors;
            push_link(&self.graph, &mut self.batch.tree_links, link, colored);
        }
    }

    /// Adds a non-tree link if it is visible.
    pub fn add_nontree_link(&mut self, link: LinkIndex) {
        if self.config.include_nontree_links {
            let colored = self.config.include_nontree_link_colors;
            push_link(&self.graph, &mut self.batch.nontree_links, link, colored);
        }
    }

    /// Adds a render queue element.
    pub fn add(&mut self, element: Element) {
        match element {
            Element::Node(node) => self.add_node(node),
            Element::TreeLink(link) => self.add_tree_link(link),
            Element::NontreeLink(link) => self.add_nontree_link(link),
        }
    }

    /// Hands the current frame to `canvas`. Empty frames are skipped.
    pub fn render(&self, canvas: &mut impl Canvas) {
        if !self.batch.is_empty() {
            canvas.draw_batch(&self.batch);
        }
    }

    /// Geometry of the current frame.
    #[must_use]
    pub fn batch(&self) -> &DrawBatch {
        &self.batch
    }
}

fn push_link(graph: &GraphStore, lines: &mut LineSet, link: LinkIndex, colored: bool) {
    if !graph.is_link_visible(link) {
        return;
    }
    let source = graph.node_coordinates(graph.link_source(link));
    let destination = graph.node_coordinates(graph.link_destination(link));
    lines.segments.push([source, destination]);
    if colored {
        lines.colors.push(graph.link_color(link));
    }
}
