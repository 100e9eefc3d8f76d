//! Nodes: the layer tree over meets.

use std::collections::BTreeSet;

use super::{NodeData, Soln, UndoOp};
use crate::ids::{MeetId, NodeId, ZoneId};

impl Soln {
    pub fn node_make(&mut self) -> NodeId {
        self.nodes.push(Some(NodeData::default()));
        let node = NodeId::new(self.nodes.len() - 1);
        self.log(UndoOp::NodeMake(node));
        node
    }

    /// Deletes an empty node: it must have no meets and no child nodes. It
    /// is removed from its parent and parent layers, and its zones and
    /// child layers are deleted.
    pub fn node_delete(&mut self, node: NodeId) {
        let n = self.node_data(node);
        assert!(n.meets.is_empty(), "node_delete: {} has meets", node);
        assert!(n.children.is_empty(), "node_delete: {} has children", node);
        assert!(node != self.cycle_node(), "node_delete: cycle node");
        while let Some(&layer) = self.node_data(node).parent_layers.last() {
            self.layer_delete_child_node(layer, node);
        }
        if self.node_data(node).parent.is_some() {
            let deleted = self.node_delete_parent(node);
            debug_assert!(deleted);
        }
        while let Some(&layer) = self.node_data(node).child_layers.last() {
            self.layer_delete(layer);
        }
        while let Some(&zone) = self.node_data(node).zones.last() {
            self.zone_delete(zone);
        }
        if let Some(data) = self.nodes[node.index()].take() {
            self.log(UndoOp::NodeDelete(node, Box::new(data)));
        }
    }

    pub fn node_exists(&self, node: NodeId) -> bool {
        self.nodes.get(node.index()).is_some_and(Option::is_some)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Adds `meet` to `node`. Fails when the meet already lies in a node.
    pub fn node_add_meet(&mut self, node: NodeId, meet: MeetId) -> bool {
        if self.meet_data(meet).node.is_some() {
            return false;
        }
        self.node_data_mut(node).meets.push(meet);
        self.meet_data_mut(meet).node = Some(node);
        self.log(UndoOp::NodeAddMeet(node, meet));
        true
    }

    /// Removes `meet` from `node`, clearing its zones.
    pub fn node_delete_meet(&mut self, node: NodeId, meet: MeetId) {
        assert_eq!(
            self.meet_data(meet).node,
            Some(node),
            "node_delete_meet: {} not in {}",
            meet,
            node
        );
        for offset in 0..self.meet_data(meet).duration {
            if let Some(zone) = self.meet_data(meet).zones[offset] {
                self.zone_delete_meet_offset(zone, meet, offset);
            }
        }
        let meets = &mut self.node_data_mut(node).meets;
        if let Some(pos) = meets.iter().position(|m| *m == meet) {
            meets.remove(pos);
            self.meet_data_mut(meet).node = None;
            self.log(UndoOp::NodeDeleteMeet(node, meet, pos));
        }
    }

    pub fn node_meets(&self, node: NodeId) -> &[MeetId] {
        &self.node_data(node).meets
    }

    pub fn node_meet_count(&self, node: NodeId) -> usize {
        self.node_data(node).meets.len()
    }

    pub fn node_parent(&self, node: NodeId) -> Option<NodeId> {
        self.node_data(node).parent
    }

    pub fn node_children(&self, node: NodeId) -> &[NodeId] {
        &self.node_data(node).children
    }

    pub fn node_child_count(&self, node: NodeId) -> usize {
        self.node_data(node).children.len()
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn node_has_ancestor(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.node_data(n).parent;
        }
        false
    }

    /// Makes `child` a child of `parent`. Fails when `child` already has a
    /// parent or the change would create a cycle.
    pub fn node_add_parent(&mut self, child: NodeId, parent: NodeId) -> bool {
        if self.node_data(child).parent.is_some() || self.node_has_ancestor(parent, child) {
            return false;
        }
        self.node_data_mut(child).parent = Some(parent);
        self.node_data_mut(parent).children.push(child);
        self.log(UndoOp::NodeAddParent(child));
        true
    }

    /// Removes `child` from its parent and from the parent's layers. Fails
    /// when `child` has no parent or any of its meets is assigned.
    pub fn node_delete_parent(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.node_data(child).parent else {
            return false;
        };
        if self
            .node_data(child)
            .meets
            .iter()
            .any(|m| self.meet_data(*m).asst.is_some())
        {
            return false;
        }
        while let Some(&layer) = self.node_data(child).parent_layers.last() {
            self.layer_delete_child_node(layer, child);
        }
        let children = &mut self.node_data_mut(parent).children;
        let pos = children
            .iter()
            .position(|c| *c == child)
            .unwrap_or_else(|| panic!("node_delete_parent: {} missing from parent", child));
        children.remove(pos);
        self.node_data_mut(child).parent = None;
        self.log(UndoOp::NodeDeleteParent(child, parent, pos));
        true
    }

    /// Moves `child` to be a child of `parent`.
    pub fn node_move(&mut self, child: NodeId, parent: NodeId) -> bool {
        if self.node_has_ancestor(parent, child) {
            return false;
        }
        if self.node_data(child).parent.is_some() && !self.node_delete_parent(child) {
            return false;
        }
        self.node_add_parent(child, parent)
    }

    /// Swaps the child nodes and child layers of `a` and `b`. Fails when
    /// either node is an ancestor of the other or any child meet is
    /// assigned.
    pub fn node_swap_child_nodes_and_layers(&mut self, a: NodeId, b: NodeId) -> bool {
        if self.node_has_ancestor(a, b) || self.node_has_ancestor(b, a) {
            return false;
        }
        let any_assigned = [a, b].iter().any(|n| {
            self.node_data(*n).children.iter().any(|c| {
                self.node_data(*c)
                    .meets
                    .iter()
                    .any(|m| self.meet_data(*m).asst.is_some())
            })
        });
        if any_assigned {
            return false;
        }
        self.raw_node_swap_children(a, b);
        self.log(UndoOp::NodeSwapChildren(a, b));
        true
    }

    pub(crate) fn raw_node_swap_children(&mut self, a: NodeId, b: NodeId) {
        let a_children = std::mem::take(&mut self.node_data_mut(a).children);
        let b_children = std::mem::take(&mut self.node_data_mut(b).children);
        let a_layers = std::mem::take(&mut self.node_data_mut(a).child_layers);
        let b_layers = std::mem::take(&mut self.node_data_mut(b).child_layers);
        for c in &a_children {
            self.node_data_mut(*c).parent = Some(b);
        }
        for c in &b_children {
            self.node_data_mut(*c).parent = Some(a);
        }
        for l in &a_layers {
            self.layer_data_mut(*l).parent = b;
        }
        for l in &b_layers {
            self.layer_data_mut(*l).parent = a;
        }
        let na = self.node_data_mut(a);
        na.children = b_children;
        na.child_layers = b_layers;
        let nb = self.node_data_mut(b);
        nb.children = a_children;
        nb.child_layers = a_layers;
    }

    /// Total duration of the node's meets.
    pub fn node_duration(&self, node: NodeId) -> usize {
        self.node_data(node)
            .meets
            .iter()
            .map(|m| self.meet_data(*m).duration)
            .sum()
    }

    /// Total duration of the node's assigned meets.
    pub fn node_assigned_duration(&self, node: NodeId) -> usize {
        self.node_data(node)
            .meets
            .iter()
            .filter(|m| self.meet_data(**m).asst.is_some())
            .map(|m| self.meet_data(*m).duration)
            .sum()
    }

    /// The largest duration of an unassigned meet of a child of `node`.
    pub fn node_max_unassigned_child_duration(&self, node: NodeId) -> usize {
        self.node_data(node)
            .children
            .iter()
            .flat_map(|c| self.node_data(*c).meets.iter())
            .filter(|m| self.meet_data(**m).asst.is_none())
            .map(|m| self.meet_data(*m).duration)
            .max()
            .unwrap_or(0)
    }

    /// Number of demand nodes in the subtrees of the node's meets.
    pub fn node_demand(&self, node: NodeId) -> usize {
        self.node_data(node)
            .meets
            .iter()
            .map(|m| self.meet_demand(*m))
            .sum()
    }

    /// How many more parent zones the node's assigned meets touch than the
    /// one they would ideally occupy. Zero when the parent has at most one
    /// zone.
    pub fn node_irregularity(&self, node: NodeId) -> usize {
        let Some(parent) = self.node_data(node).parent else {
            return 0;
        };
        if self.node_data(parent).zones.len() <= 1 {
            return 0;
        }
        let mut touched: BTreeSet<Option<ZoneId>> = BTreeSet::new();
        for meet in &self.node_data(node).meets {
            let m = self.meet_data(*meet);
            if let Some((target, offset)) = m.asst {
                let zones = &self.meet_data(target).zones;
                touched.extend((offset..offset + m.duration).map(|i| zones[i]));
            }
        }
        touched.len().saturating_sub(1)
    }

    /// Nodes of the subtree rooted at `node`, children before parents.
    pub fn node_postorder(&self, node: NodeId) -> Vec<NodeId> {
        let mut res = Vec::new();
        self.collect_postorder(node, &mut res);
        res
    }

    fn collect_postorder(&self, node: NodeId, res: &mut Vec<NodeId>) {
        for child in &self.node_data(node).children {
            self.collect_postorder(*child, res);
        }
        res.push(node);
    }
}
