// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays graph storage with fixed topology and mutable attributes.

use core::fmt;

use crate::geometry::{Point4, Transform3d};

use super::attr::{ColorColumn, F64Column, FlagColumn};
use super::id::{LinkIndex, LinkKind, Links, NONE, NodeIndex};

/// Struct-of-arrays storage for a spanning tree plus non-tree links.
///
/// Nodes and links are addressed by dense [`NodeIndex`] / [`LinkIndex`]
/// values. Topology and layout coordinates are fixed once the store leaves
/// its [`GraphBuilder`](super::GraphBuilder); radii, display coordinates,
/// colors and the displayable/selected/visible flags may be mutated through
/// `&self` so that a store shared between the transformer and renderers
/// needs no lock.
///
/// Each node's outgoing links form one contiguous range, child links first:
///
/// ```text
///   child_start(n) ≤ nontree_start(n) ≤ links_end(n) ≤ num_links()
///   [child_start, nontree_start)   tree links to children
///   [nontree_start, links_end)     non-tree links
/// ```
pub struct GraphStore {
    // -- Node topology --
    pub(crate) node_id: Vec<u32>,
    pub(crate) parent_link: Vec<u32>,
    pub(crate) child_start: Vec<u32>,
    pub(crate) nontree_start: Vec<u32>,
    pub(crate) links_end: Vec<u32>,
    pub(crate) layout: Vec<Point4>,
    pub(crate) root: u32,

    // -- Node attributes --
    pub(crate) radius: F64Column,
    pub(crate) x: F64Column,
    pub(crate) y: F64Column,
    pub(crate) z: F64Column,
    pub(crate) node_color: ColorColumn,
    pub(crate) node_displayable: FlagColumn,
    pub(crate) node_selected: FlagColumn,
    pub(crate) node_visible: FlagColumn,

    // -- Link topology --
    pub(crate) link_id: Vec<u32>,
    pub(crate) source: Vec<u32>,
    pub(crate) destination: Vec<u32>,
    pub(crate) is_tree_link: Vec<bool>,
    pub(crate) num_tree_links: usize,

    // -- Link attributes --
    pub(crate) link_color: ColorColumn,
    pub(crate) link_displayable: FlagColumn,
    pub(crate) link_selected: FlagColumn,
    pub(crate) link_visible: FlagColumn,
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("num_nodes", &self.num_nodes())
            .field("num_tree_links", &self.num_tree_links)
            .field("num_nontree_links", &self.num_nontree_links())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Result of [`GraphStore::check_tree_reachability`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reachability {
    /// Number of distinct nodes reached through tree links.
    pub reachable: usize,
    /// Whether some node was reached more than once.
    pub revisited: bool,
    /// Nodes never reached, in index order.
    pub unreachable: Vec<NodeIndex>,
}

impl GraphStore {
    #[inline]
    #[track_caller]
    pub(super) fn node_slot(&self, node: NodeIndex) -> usize {
        let i = node.index();
        assert!(
            i < self.node_id.len(),
            "node index {i} out of range (num_nodes {})",
            self.node_id.len()
        );
        i
    }

    #[inline]
    #[track_caller]
    fn link_slot(&self, link: LinkIndex) -> usize {
        let i = link.index();
        assert!(
            i < self.link_id.len(),
            "link index {i} out of range (num_links {})",
            self.link_id.len()
        );
        i
    }

    // -- Counts --

    /// Number of nodes.
    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_id.len()
    }

    /// Total number of links, tree and non-tree.
    #[inline]
    #[must_use]
    pub fn num_links(&self) -> usize {
        self.link_id.len()
    }

    /// Number of spanning-tree links.
    #[inline]
    #[must_use]
    pub fn num_tree_links(&self) -> usize {
        self.num_tree_links
    }

    /// Number of non-tree links.
    #[inline]
    #[must_use]
    pub fn num_nontree_links(&self) -> usize {
        self.link_id.len() - self.num_tree_links
    }

    /// The root of the spanning tree.
    ///
    /// For an empty graph this is `NodeIndex(0)`, which no accessor accepts.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex(self.root)
    }

    /// Iterates all node indices.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeIndex> + use<> {
        (0..self.node_id.len()).map(NodeIndex::new)
    }

    // -- Node topology --

    /// External identifier of a node in its backing store.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_id(&self, node: NodeIndex) -> u32 {
        self.node_id[self.node_slot(node)]
    }

    /// The tree link leading to `node`, or `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_parent_link(&self, node: NodeIndex) -> Option<LinkIndex> {
        match self.parent_link[self.node_slot(node)] {
            NONE => None,
            link => Some(LinkIndex(link)),
        }
    }

    /// The tree parent of `node`, or `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.node_parent_link(node)
            .map(|link| NodeIndex(self.source[link.index()]))
    }

    /// Number of tree children of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_num_children(&self, node: NodeIndex) -> usize {
        self.child_links(node).len()
    }

    /// Index of the first child link of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn child_start(&self, node: NodeIndex) -> usize {
        self.child_start[self.node_slot(node)] as usize
    }

    /// Index of the first non-tree link of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn nontree_start(&self, node: NodeIndex) -> usize {
        self.nontree_start[self.node_slot(node)] as usize
    }

    /// One past the last link of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn links_end(&self, node: NodeIndex) -> usize {
        self.links_end[self.node_slot(node)] as usize
    }

    /// Tree links from `node` to its children.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn child_links(&self, node: NodeIndex) -> Links {
        let i = self.node_slot(node);
        Links::new(self.child_start[i], self.nontree_start[i])
    }

    /// Non-tree links leaving `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn nontree_links(&self, node: NodeIndex) -> Links {
        let i = self.node_slot(node);
        Links::new(self.nontree_start[i], self.links_end[i])
    }

    /// All links leaving `node`, child links first.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn outgoing_links(&self, node: NodeIndex) -> Links {
        let i = self.node_slot(node);
        Links::new(self.child_start[i], self.links_end[i])
    }

    // -- Node coordinates --

    /// Visual radius last computed for `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_radius(&self, node: NodeIndex) -> f64 {
        self.radius.get(self.node_slot(node))
    }

    /// Stores the visual radius of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_radius(&self, node: NodeIndex, radius: f64) {
        self.radius.set(self.node_slot(node), radius);
    }

    /// Current (post-transform) display coordinates of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_coordinates(&self, node: NodeIndex) -> [f64; 3] {
        let i = self.node_slot(node);
        [self.x.get(i), self.y.get(i), self.z.get(i)]
    }

    /// Display coordinates of `node` as a homogeneous point with `w = 1`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_point(&self, node: NodeIndex) -> Point4 {
        let [x, y, z] = self.node_coordinates(node);
        Point4::from_affine(x, y, z)
    }

    /// Stores affine display coordinates for `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_coordinates(&self, node: NodeIndex, [x, y, z]: [f64; 3]) {
        let i = self.node_slot(node);
        self.x.set(i, x);
        self.y.set(i, y);
        self.z.set(i, z);
    }

    /// Stores display coordinates for `node` from a homogeneous point,
    /// dividing through by `w`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_point(&self, node: NodeIndex, p: Point4) {
        self.set_node_coordinates(node, p.affine());
    }

    /// Layout coordinates of `node` divided through by `w`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_layout_coordinates(&self, node: NodeIndex) -> [f64; 3] {
        self.layout[self.node_slot(node)].affine()
    }

    /// Raw homogeneous layout coordinates of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_layout_point(&self, node: NodeIndex) -> Point4 {
        self.layout[self.node_slot(node)]
    }

    /// Replaces the layout coordinates of `node`.
    ///
    /// Requires exclusive access: layout is fixed once the store is shared.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_layout_point(&mut self, node: NodeIndex, p: Point4) {
        let i = self.node_slot(node);
        self.layout[i] = p;
    }

    /// Recomputes display coordinates of every node as `t · layout`.
    pub fn transform_nodes(&self, t: &Transform3d) {
        for (i, p) in self.layout.iter().enumerate() {
            let [x, y, z] = t.apply(*p).affine();
            self.x.set(i, x);
            self.y.set(i, y);
            self.z.set(i, z);
        }
    }

    // -- Node attributes --

    /// Packed `0xRRGGBB` color of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn node_color(&self, node: NodeIndex) -> u32 {
        self.node_color.get(self.node_slot(node))
    }

    /// Sets the packed `0xRRGGBB` color of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_color(&self, node: NodeIndex, color: u32) {
        self.node_color.set(self.node_slot(node), color);
    }

    /// Sets the color of `node` from components.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_color_rgb(&self, node: NodeIndex, r: u8, g: u8, b: u8) {
        self.set_node_color(node, pack_rgb(r, g, b));
    }

    /// Sets the color of every node.
    pub fn set_node_default_color(&self, color: u32) {
        self.node_color.fill(color);
    }

    /// Whether `node` is drawn (displayable and selected).
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn is_node_visible(&self, node: NodeIndex) -> bool {
        self.node_visible.get(self.node_slot(node))
    }

    /// Whether `node` is displayable.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn is_node_displayable(&self, node: NodeIndex) -> bool {
        self.node_displayable.get(self.node_slot(node))
    }

    /// Whether `node` is selected.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    #[must_use]
    pub fn is_node_selected(&self, node: NodeIndex) -> bool {
        self.node_selected.get(self.node_slot(node))
    }

    /// Whether every node is visible.
    #[must_use]
    pub fn nodes_all_visible(&self) -> bool {
        self.node_visible.all()
    }

    /// Number of visible nodes.
    #[must_use]
    pub fn num_visible_nodes(&self) -> usize {
        self.node_visible.count()
    }

    /// Sets displayability of `node`. Takes effect at the next
    /// [`compute_visibility`](Self::compute_visibility).
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_displayable(&self, node: NodeIndex, displayable: bool) {
        self.node_displayable.set(self.node_slot(node), displayable);
    }

    /// Sets selection of `node`. Takes effect at the next
    /// [`compute_visibility`](Self::compute_visibility).
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn set_node_selected(&self, node: NodeIndex, selected: bool) {
        self.node_selected.set(self.node_slot(node), selected);
    }

    /// Sets displayability of every node.
    pub fn set_all_nodes_displayable(&self, displayable: bool) {
        self.node_displayable.fill(displayable);
    }

    /// Sets selection of every node.
    pub fn set_all_nodes_selected(&self, selected: bool) {
        self.node_selected.fill(selected);
    }

    // -- Links --

    /// External identifier of a link in its backing store.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn link_id(&self, link: LinkIndex) -> u32 {
        self.link_id[self.link_slot(link)]
    }

    /// Source node of `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn link_source(&self, link: LinkIndex) -> NodeIndex {
        NodeIndex(self.source[self.link_slot(link)])
    }

    /// Destination node of `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn link_destination(&self, link: LinkIndex) -> NodeIndex {
        NodeIndex(self.destination[self.link_slot(link)])
    }

    /// Whether `link` is part of the spanning tree.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn is_tree_link(&self, link: LinkIndex) -> bool {
        self.is_tree_link[self.link_slot(link)]
    }

    /// Tree or non-tree.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn link_kind(&self, link: LinkIndex) -> LinkKind {
        if self.is_tree_link(link) {
            LinkKind::Tree
        } else {
            LinkKind::Nontree
        }
    }

    /// Packed `0xRRGGBB` color of `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn link_color(&self, link: LinkIndex) -> u32 {
        self.link_color.get(self.link_slot(link))
    }

    /// Sets the packed `0xRRGGBB` color of `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    pub fn set_link_color(&self, link: LinkIndex, color: u32) {
        self.link_color.set(self.link_slot(link), color);
    }

    /// Sets the color of `link` from components.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    pub fn set_link_color_rgb(&self, link: LinkIndex, r: u8, g: u8, b: u8) {
        self.set_link_color(link, pack_rgb(r, g, b));
    }

    /// Sets the color of every link.
    pub fn set_link_default_color(&self, color: u32) {
        self.link_color.fill(color);
    }

    /// Whether `link` is drawn.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn is_link_visible(&self, link: LinkIndex) -> bool {
        self.link_visible.get(self.link_slot(link))
    }

    /// Whether `link` is displayable.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn is_link_displayable(&self, link: LinkIndex) -> bool {
        self.link_displayable.get(self.link_slot(link))
    }

    /// Whether `link` is selected.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    #[must_use]
    pub fn is_link_selected(&self, link: LinkIndex) -> bool {
        self.link_selected.get(self.link_slot(link))
    }

    /// Whether every link is visible.
    #[must_use]
    pub fn links_all_visible(&self) -> bool {
        self.link_visible.all()
    }

    /// Sets displayability of `link`.
    ///
    /// Non-tree link displayability is recomputed from endpoint visibility by
    /// [`compute_visibility`](Self::compute_visibility).
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    pub fn set_link_displayable(&self, link: LinkIndex, displayable: bool) {
        self.link_displayable.set(self.link_slot(link), displayable);
    }

    /// Sets selection of `link`.
    ///
    /// # Panics
    ///
    /// Panics if `link` is out of range.
    pub fn set_link_selected(&self, link: LinkIndex, selected: bool) {
        self.link_selected.set(self.link_slot(link), selected);
    }

    /// Sets displayability of every link, or of every link of one kind.
    pub fn set_all_links_displayable(&self, kind: Option<LinkKind>, displayable: bool) {
        match kind {
            None => self.link_displayable.fill(displayable),
            Some(kind) => self
                .link_displayable
                .fill_where(displayable, |i| self.is_tree_link[i] == (kind == LinkKind::Tree)),
        }
    }

    /// Sets selection of every link, or of every link of one kind.
    pub fn set_all_links_selected(&self, kind: Option<LinkKind>, selected: bool) {
        match kind {
            None => self.link_selected.fill(selected),
            Some(kind) => self
                .link_selected
                .fill_where(selected, |i| self.is_tree_link[i] == (kind == LinkKind::Tree)),
        }
    }

    // -- Diagnostics --

    /// Walks tree links from the root and returns the number of nodes
    /// reached, or `None` if some node is reached twice (a cycle or a
    /// duplicated tree link).
    #[must_use]
    pub fn check_spanning_tree(&self) -> Option<usize> {
        if self.num_nodes() == 0 {
            return Some(0);
        }
        let r = self.check_tree_reachability(self.root());
        (!r.revisited).then_some(r.reachable)
    }

    /// Walks tree links from `start`, reporting reachable and unreachable
    /// nodes.
    ///
    /// # Panics
    ///
    /// Panics if `start` is out of range.
    #[must_use]
    pub fn check_tree_reachability(&self, start: NodeIndex) -> Reachability {
        let mut visited = vec![false; self.num_nodes()];
        let mut stack = vec![self.node_slot(start)];
        let mut reachable = 0;
        let mut revisited = false;
        while let Some(i) = stack.pop() {
            if visited[i] {
                revisited = true;
                continue;
            }
            visited[i] = true;
            reachable += 1;
            for link in self.child_start[i]..self.nontree_start[i] {
                stack.push(self.destination[link as usize] as usize);
            }
        }
        if revisited {
            tracing::warn!("node reached more than once in the spanning tree");
        }
        let unreachable = visited
            .iter()
            .enumerate()
            .filter(|&(_, v)| !v)
            .map(|(i, _)| NodeIndex::new(i))
            .collect();
        Reachability {
            reachable,
            revisited,
            unreachable,
        }
    }

    /// Number of nodes whose layout coordinates are all finite.
    #[must_use]
    pub fn check_layout_coordinates(&self) -> usize {
        self.layout.iter().filter(|p| p.is_finite()).count()
    }

    /// Moves nodes with non-finite layout coordinates to the origin and
    /// returns how many were moved.
    pub fn sanitize_layout_coordinates(&mut self) -> usize {
        let mut fixed = 0;
        for p in &mut self.layout {
            if !p.is_finite() {
                *p = Point4::ORIGIN;
                fixed += 1;
            }
        }
        if fixed > 0 {
            tracing::debug!(fixed, "moved non-finite layout points to the origin");
        }
        fixed
    }
}

/// Packs 8-bit components into `0xRRGGBB`.
#[inline]
#[must_use]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Splits `0xRRGGBB` into 8-bit components.
#[inline]
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "each component is masked to 8 bits"
)]
pub const fn unpack_rgb(color: u32) -> [u8; 3] {
    [
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    ]
}
