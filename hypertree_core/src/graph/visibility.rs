// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility recomputation and the operations that shape it.
//!
//! Every shaping operation only writes displayability and then calls
//! [`GraphStore::compute_visibility`] once. Subtree walks use an explicit
//! stack so deep trees cannot overflow the call stack.

use super::id::NodeIndex;
use super::store::GraphStore;

impl GraphStore {
    /// Recomputes node and link visibility from displayability and selection.
    ///
    /// Node visibility is finalized first. Non-tree link displayability is
    /// then overwritten with "both endpoints visible", and link visibility is
    /// finalized last.
    pub fn compute_visibility(&self) {
        self.node_visible
            .assign_conjunction(&self.node_displayable, &self.node_selected);
        self.compute_nontree_link_displayability();
        self.link_visible
            .assign_conjunction(&self.link_displayable, &self.link_selected);
    }

    fn compute_nontree_link_displayability(&self) {
        if self.num_nontree_links() == 0 {
            return;
        }
        for n in 0..self.num_nodes() {
            let start = self.nontree_start[n] as usize;
            let end = self.links_end[n] as usize;
            if start == end {
                continue;
            }
            let source_visible = self.node_visible.get(n);
            for link in start..end {
                let displayable =
                    source_visible && self.node_visible.get(self.destination[link] as usize);
                self.link_displayable.set(link, displayable);
            }
        }
    }

    /// Sets displayability of every strict descendant of `node` and of the
    /// tree links leading to them. `node` itself is left alone.
    fn set_subtree_displayability(&self, node: usize, displayable: bool) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            for link in self.child_start[n]..self.nontree_start[n] {
                let link = link as usize;
                let child = self.destination[link] as usize;
                self.node_displayable.set(child, displayable);
                self.link_displayable.set(link, displayable);
                stack.push(child);
            }
        }
    }

    /// Hides `node`, its parent link and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn prune_subtree(&self, node: NodeIndex) {
        if let Some(link) = self.node_parent_link(node) {
            self.set_link_displayable(link, false);
        }
        self.set_node_displayable(node, false);
        self.set_subtree_displayability(node.index(), false);
        self.compute_visibility();
    }

    /// Within the subtree of `node`, shows descendants fewer than `distance`
    /// tree links away and hides the rest. `node` itself is left alone.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn prune_to_neighborhood(&self, node: NodeIndex, distance: usize) {
        let mut stack = vec![(self.node_slot(node), 0_usize)];
        while let Some((n, depth)) = stack.pop() {
            let displayable = depth < distance;
            for link in self.child_start[n]..self.nontree_start[n] {
                let link = link as usize;
                let child = self.destination[link] as usize;
                self.node_displayable.set(child, displayable);
                self.link_displayable.set(link, displayable);
                stack.push((child, depth + 1));
            }
        }
        self.compute_visibility();
    }

    /// Shows only `node`, the tree path from it to the root, and its subtree.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn narrow(&self, node: NodeIndex) {
        self.node_displayable.fill(false);
        self.link_displayable.fill(false);
        self.set_node_displayable(node, true);

        let mut current = node;
        while let Some(link) = self.node_parent_link(current) {
            let parent = self.link_source(link);
            self.set_link_displayable(link, true);
            self.set_node_displayable(parent, true);
            current = parent;
        }

        self.set_subtree_displayability(node.index(), true);
        self.compute_visibility();
    }

    /// Shows `node` and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn widen_subtree(&self, node: NodeIndex) {
        self.set_node_displayable(node, true);
        self.set_subtree_displayability(node.index(), true);
        self.compute_visibility();
    }

    /// Walks up from `node` to the nearest ancestor with more than one child
    /// (or the root), shows that ancestor's subtree and returns the ancestor.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn widen_toward_root(&self, node: NodeIndex) -> NodeIndex {
        let mut current = node;
        while let Some(parent) = self.node_parent(current) {
            current = parent;
            if self.node_num_children(parent) > 1 {
                break;
            }
        }
        self.set_subtree_displayability(current.index(), true);
        self.compute_visibility();
        current
    }

    /// Makes every node and link displayable, leaving selection in charge.
    pub fn widen_all(&self) {
        self.node_displayable.fill(true);
        self.link_displayable.fill(true);
        self.compute_visibility();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::graph::{GraphBuilder, GraphStore, LinkIndex, NodeIndex};

    /// ```text
    ///         0
    ///        / \
    ///       1   2
    ///       |
    ///       3
    ///      / \
    ///     4   5
    /// ```
    /// plus a non-tree link 4 -> 2.
    fn tree() -> GraphStore {
        let mut b = GraphBuilder::new(6, 6);
        b.set_root(NodeIndex::new(0)).unwrap();
        let mut l = b.links(NodeIndex::new(0)).unwrap();
        l.add_child(NodeIndex::new(1), 0).unwrap();
        l.add_child(NodeIndex::new(2), 1).unwrap();
        l.end();
        b.links(NodeIndex::new(1))
            .unwrap()
            .add_child(NodeIndex::new(3), 2)
            .unwrap();
        let mut l = b.links(NodeIndex::new(3)).unwrap();
        l.add_child(NodeIndex::new(4), 3).unwrap();
        l.add_child(NodeIndex::new(5), 4).unwrap();
        l.end();
        let l = b.links(NodeIndex::new(4)).unwrap();
        let mut nt = l.nontree();
        nt.add_nontree(NodeIndex::new(2), 5).unwrap();
        nt.end();
        b.build().unwrap()
    }

    fn visible_nodes(g: &GraphStore) -> Vec<usize> {
        g.nodes()
            .filter(|&n| g.is_node_visible(n))
            .map(NodeIndex::index)
            .collect()
    }

    fn visible_links(g: &GraphStore) -> Vec<usize> {
        (0..g.num_links())
            .filter(|&l| g.is_link_visible(LinkIndex::new(l)))
            .collect()
    }

    #[test]
    fn visible_is_conjunction() {
        let g = tree();
        g.set_node_selected(NodeIndex::new(5), false);
        g.set_node_displayable(NodeIndex::new(2), false);
        g.compute_visibility();
        assert_eq!(visible_nodes(&g), [0, 1, 3, 4]);
    }

    #[test]
    fn nontree_link_needs_both_endpoints() {
        let g = tree();
        g.compute_visibility();
        assert!(g.is_link_visible(LinkIndex::new(5)));
        g.set_node_selected(NodeIndex::new(2), false);
        g.compute_visibility();
        assert!(!g.is_link_displayable(LinkIndex::new(5)));
        assert!(!g.is_link_visible(LinkIndex::new(5)));
        g.set_node_selected(NodeIndex::new(2), true);
        g.compute_visibility();
        assert!(g.is_link_visible(LinkIndex::new(5)));
    }

    #[test]
    fn prune_subtree_hides_parent_link_and_descendants() {
        let g = tree();
        g.prune_subtree(NodeIndex::new(3));
        assert_eq!(visible_nodes(&g), [0, 1, 2]);
        assert_eq!(visible_links(&g), [0, 1]);
    }

    #[test]
    fn prune_to_neighborhood_keeps_near_descendants() {
        let g = tree();
        g.prune_to_neighborhood(NodeIndex::new(0), 2);
        assert_eq!(visible_nodes(&g), [0, 1, 2, 3]);
        g.prune_to_neighborhood(NodeIndex::new(0), 0);
        assert_eq!(visible_nodes(&g), [0]);
        assert!(visible_links(&g).is_empty());
    }

    #[test]
    fn narrow_keeps_path_and_subtree() {
        let g = tree();
        g.narrow(NodeIndex::new(3));
        assert_eq!(visible_nodes(&g), [0, 1, 3, 4, 5]);
        assert_eq!(visible_links(&g), [0, 2, 3, 4]);
    }

    #[test]
    fn widen_toward_root_stops_at_branching_ancestor() {
        let g = tree();
        g.narrow(NodeIndex::new(4));
        assert_eq!(visible_nodes(&g), [0, 1, 3, 4]);
        let widened = g.widen_toward_root(NodeIndex::new(4));
        assert_eq!(widened, NodeIndex::new(3));
        assert_eq!(visible_nodes(&g), [0, 1, 3, 4, 5]);
        let widened = g.widen_toward_root(NodeIndex::new(3));
        assert_eq!(widened, NodeIndex::new(0));
        assert_eq!(visible_nodes(&g), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn widen_subtree_restores_pruned_nodes() {
        let g = tree();
        g.prune_subtree(NodeIndex::new(1));
        assert_eq!(visible_nodes(&g), [0, 2]);
        g.widen_subtree(NodeIndex::new(1));
        assert_eq!(visible_nodes(&g), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn widen_all_then_compute_is_idempotent() {
        let g = tree();
        g.set_node_selected(NodeIndex::new(4), false);
        g.narrow(NodeIndex::new(1));
        g.widen_all();
        let first = (visible_nodes(&g), visible_links(&g));
        g.compute_visibility();
        let second = (visible_nodes(&g), visible_links(&g));
        g.compute_visibility();
        let third = (visible_nodes(&g), visible_links(&g));
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(first.0, [0, 1, 2, 3, 5]);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let n = 200_000;
        let mut b = GraphBuilder::new(n, n - 1);
        b.set_root(NodeIndex::new(0)).unwrap();
        for i in 0..n - 1 {
            b.links(NodeIndex::new(i))
                .unwrap()
                .add_child(NodeIndex::new(i + 1), 0)
                .unwrap();
        }
        let g = b.build().unwrap();
        g.prune_subtree(NodeIndex::new(1));
        assert_eq!(g.num_visible_nodes(), 1);
        g.widen_all();
        assert!(g.nodes_all_visible());
    }
}
