// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Write-once construction of a [`GraphStore`].
//!
//! Link ranges are populated one node at a time through a borrow chain:
//!
//! ```text
//! builder.links(n)? ──► ChildLinks ──nontree()──► NontreeLinks ──end()
//!                         add_child*                add_nontree*
//! ```
//!
//! The chain holds `&mut GraphBuilder`, so a second node's links cannot be
//! started while the first is still open, and the child-before-non-tree
//! order is fixed by the types.

use crate::error::GraphError;
use crate::geometry::Point4;

use super::attr::{ColorColumn, F64Column, FlagColumn};
use super::id::{NONE, NodeIndex};
use super::store::GraphStore;

/// Color given to every node until changed.
pub const DEFAULT_NODE_COLOR: u32 = 0xff_ff_ff;
/// Color given to every link until changed.
pub const DEFAULT_LINK_COLOR: u32 = 0xb4_b4_b4;

/// Builder for a [`GraphStore`] with fixed node and link counts.
#[derive(Debug)]
pub struct GraphBuilder {
    num_links: usize,
    node_id: Vec<u32>,
    layout: Vec<Point4>,
    root: Option<u32>,
    parent_link: Vec<u32>,
    child_start: Vec<u32>,
    nontree_start: Vec<u32>,
    links_end: Vec<u32>,
    populated: Vec<bool>,
    link_id: Vec<u32>,
    source: Vec<u32>,
    destination: Vec<u32>,
    is_tree_link: Vec<bool>,
    num_tree_links: usize,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "node and link counts are checked against the u32 index space in `new`"
)]
impl GraphBuilder {
    /// Creates a builder for `num_nodes` nodes and exactly `num_links` links.
    ///
    /// Node ids default to the node index and layout points to the origin.
    ///
    /// # Panics
    ///
    /// Panics if either count does not fit the `u32` index space.
    #[must_use]
    pub fn new(num_nodes: usize, num_links: usize) -> Self {
        assert!(
            u32::try_from(num_nodes).is_ok_and(|n| n != NONE),
            "node count {num_nodes} exceeds index space"
        );
        assert!(
            u32::try_from(num_links).is_ok_and(|n| n != NONE),
            "link count {num_links} exceeds index space"
        );
        Self {
            num_links,
            node_id: (0..num_nodes as u32).collect(),
            layout: vec![Point4::ORIGIN; num_nodes],
            root: None,
            parent_link: vec![NONE; num_nodes],
            child_start: vec![0; num_nodes],
            nontree_start: vec![0; num_nodes],
            links_end: vec![0; num_nodes],
            populated: vec![false; num_nodes],
            link_id: Vec::with_capacity(num_links),
            source: Vec::with_capacity(num_links),
            destination: Vec::with_capacity(num_links),
            is_tree_link: Vec::with_capacity(num_links),
            num_tree_links: 0,
        }
    }

    /// Declared node count.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.node_id.len()
    }

    /// Number of links added so far.
    #[must_use]
    pub fn num_links_added(&self) -> usize {
        self.link_id.len()
    }

    fn check_node(&self, node: NodeIndex) -> Result<usize, GraphError> {
        let i = node.index();
        if i < self.node_id.len() {
            Ok(i)
        } else {
            Err(GraphError::NodeOutOfRange {
                node: i,
                num_nodes: self.node_id.len(),
            })
        }
    }

    /// Designates the root of the spanning tree.
    pub fn set_root(&mut self, node: NodeIndex) -> Result<(), GraphError> {
        self.check_node(node)?;
        self.root = Some(node.0);
        Ok(())
    }

    /// Sets the external id of `node`.
    pub fn set_node_id(&mut self, node: NodeIndex, id: u32) -> Result<(), GraphError> {
        let i = self.check_node(node)?;
        self.node_id[i] = id;
        Ok(())
    }

    /// Sets the homogeneous layout point of `node`.
    pub fn set_node_layout(&mut self, node: NodeIndex, p: Point4) -> Result<(), GraphError> {
        let i = self.check_node(node)?;
        self.layout[i] = p;
        Ok(())
    }

    /// Starts populating the links of `node`, child links first.
    ///
    /// Each node's links may be populated at most once.
    pub fn links(&mut self, node: NodeIndex) -> Result<ChildLinks<'_>, GraphError> {
        let i = self.check_node(node)?;
        if self.populated[i] {
            return Err(GraphError::LinksAlreadyPopulated(node));
        }
        self.populated[i] = true;
        let cursor = self.link_id.len() as u32;
        self.child_start[i] = cursor;
        self.nontree_start[i] = cursor;
        self.links_end[i] = cursor;
        Ok(ChildLinks {
            builder: self,
            node: i,
        })
    }

    fn push_link(
        &mut self,
        node: usize,
        dest: NodeIndex,
        id: u32,
        tree: bool,
    ) -> Result<u32, GraphError> {
        self.check_node(dest)?;
        if self.link_id.len() >= self.num_links {
            return Err(GraphError::LinkCapacityExceeded {
                capacity: self.num_links,
            });
        }
        let link = self.link_id.len() as u32;
        self.link_id.push(id);
        self.source.push(node as u32);
        self.destination.push(dest.0);
        self.is_tree_link.push(tree);
        Ok(link)
    }

    /// Finishes construction.
    ///
    /// The root's parent link is forced to none even when some tree link
    /// points at it; [`GraphStore::check_spanning_tree`] reports that case.
    pub fn build(self) -> Result<GraphStore, GraphError> {
        let num_nodes = self.node_id.len();
        let root = match self.root {
            Some(root) => root,
            None if num_nodes == 0 => 0,
            None => return Err(GraphError::MissingRoot),
        };
        if self.link_id.len() != self.num_links {
            return Err(GraphError::MissingLinks {
                declared: self.num_links,
                added: self.link_id.len(),
            });
        }
        let mut parent_link = self.parent_link;
        if let Some(p) = parent_link.get_mut(root as usize) {
            *p = NONE;
        }
        let display: Vec<[f64; 3]> = self.layout.iter().map(|p| p.affine()).collect();
        let num_links = self.link_id.len();
        tracing::debug!(
            num_nodes,
            num_links,
            num_tree_links = self.num_tree_links,
            "graph built"
        );
        Ok(GraphStore {
            node_id: self.node_id,
            parent_link,
            child_start: self.child_start,
            nontree_start: self.nontree_start,
            links_end: self.links_end,
            layout: self.layout,
            root,
            radius: F64Column::from_values(core::iter::repeat_n(0.0, num_nodes)),
            x: F64Column::from_values(display.iter().map(|c| c[0])),
            y: F64Column::from_values(display.iter().map(|c| c[1])),
            z: F64Column::from_values(display.iter().map(|c| c[2])),
            node_color: ColorColumn::from_values(core::iter::repeat_n(
                DEFAULT_NODE_COLOR,
                num_nodes,
            )),
            node_displayable: FlagColumn::new(num_nodes, true),
            node_selected: FlagColumn::new(num_nodes, true),
            node_visible: FlagColumn::new(num_nodes, true),
            link_id: self.link_id,
            source: self.source,
            destination: self.destination,
            is_tree_link: self.is_tree_link,
            num_tree_links: self.num_tree_links,
            link_color: ColorColumn::from_values(core::iter::repeat_n(
                DEFAULT_LINK_COLOR,
                num_links,
            )),
            link_displayable: FlagColumn::new(num_links, true),
            link_selected: FlagColumn::new(num_links, true),
            link_visible: FlagColumn::new(num_links, true),
        })
    }
}

/// Open child-link run of one node. See [`GraphBuilder::links`].
#[derive(Debug)]
pub struct ChildLinks<'a> {
    builder: &'a mut GraphBuilder,
    node: usize,
}

impl<'a> ChildLinks<'a> {
    /// Adds a tree link from this node to `child`, making this node its
    /// parent.
    pub fn add_child(&mut self, child: NodeIndex, id: u32) -> Result<(), GraphError> {
        let link = self.builder.push_link(self.node, child, id, true)?;
        let b = &mut *self.builder;
        b.parent_link[child.index()] = link;
        b.nontree_start[self.node] = link + 1;
        b.links_end[self.node] = link + 1;
        b.num_tree_links += 1;
        Ok(())
    }

    /// Closes the child run and opens the non-tree run.
    #[must_use]
    pub fn nontree(self) -> NontreeLinks<'a> {
        NontreeLinks {
            builder: self.builder,
            node: self.node,
        }
    }

    /// Closes this node's links with no non-tree links.
    pub fn end(self) {}
}

/// Open non-tree-link run of one node.
#[derive(Debug)]
pub struct NontreeLinks<'a> {
    builder: &'a mut GraphBuilder,
    node: usize,
}

impl NontreeLinks<'_> {
    /// Adds a non-tree link from this node to `dest`.
    pub fn add_nontree(&mut self, dest: NodeIndex, id: u32) -> Result<(), GraphError> {
        let link = self.builder.push_link(self.node, dest, id, false)?;
        self.builder.links_end[self.node] = link + 1;
        Ok(())
    }

    /// Closes this node's links.
    pub fn end(self) {}
}
