//! Layers: sets of child nodes of one parent, usually those sharing a
//! resource.

use std::cmp::Ordering;

use super::{LayerData, Soln, UndoOp};
use crate::ids::{LayerId, NodeId, ResourceId};

impl Soln {
    /// Creates an empty child layer of `parent`.
    pub fn layer_make(&mut self, parent: NodeId) -> LayerId {
        self.layers.push(Some(LayerData {
            parent,
            children: Vec::new(),
            resources: Vec::new(),
            visit_num: 0,
        }));
        let layer = LayerId::new(self.layers.len() - 1);
        self.node_data_mut(parent).child_layers.push(layer);
        self.log(UndoOp::LayerMake(layer));
        layer
    }

    /// Deletes `layer`, removing it from its parent and child nodes.
    pub fn layer_delete(&mut self, layer: LayerId) {
        while let Some(&child) = self.layer_data(layer).children.last() {
            self.layer_delete_child_node(layer, child);
        }
        let parent = self.layer_data(layer).parent;
        let layers = &mut self.node_data_mut(parent).child_layers;
        let pos = layers
            .iter()
            .position(|l| *l == layer)
            .unwrap_or_else(|| panic!("layer_delete: {} missing from parent", layer));
        layers.remove(pos);
        if let Some(data) = self.layers[layer.index()].take() {
            self.log(UndoOp::LayerDelete(layer, Box::new(data), pos));
        }
    }

    pub fn layer_parent(&self, layer: LayerId) -> NodeId {
        self.layer_data(layer).parent
    }

    pub fn layer_children(&self, layer: LayerId) -> &[NodeId] {
        &self.layer_data(layer).children
    }

    pub fn layer_resources(&self, layer: LayerId) -> &[ResourceId] {
        &self.layer_data(layer).resources
    }

    /// Adds child node `node` of the layer's parent to `layer`.
    pub fn layer_add_child_node(&mut self, layer: LayerId, node: NodeId) {
        assert_eq!(
            self.node_data(node).parent,
            Some(self.layer_data(layer).parent),
            "layer_add_child_node: {} is not a child of the layer's parent",
            node
        );
        if self.layer_data(layer).children.contains(&node) {
            return;
        }
        self.layer_data_mut(layer).children.push(node);
        self.node_data_mut(node).parent_layers.push(layer);
        self.log(UndoOp::LayerAddChild(layer, node));
    }

    pub fn layer_delete_child_node(&mut self, layer: LayerId, node: NodeId) {
        let children = &mut self.layer_data_mut(layer).children;
        let Some(pos) = children.iter().position(|c| *c == node) else {
            return;
        };
        children.remove(pos);
        let parent_layers = &mut self.node_data_mut(node).parent_layers;
        if let Some(i) = parent_layers.iter().position(|l| *l == layer) {
            parent_layers.remove(i);
        }
        self.log(UndoOp::LayerDeleteChild(layer, node, pos));
    }

    pub fn layer_add_resource(&mut self, layer: LayerId, r: ResourceId) {
        if self.layer_data(layer).resources.contains(&r) {
            return;
        }
        self.layer_data_mut(layer).resources.push(r);
        self.log(UndoOp::LayerAddResource(layer, r));
    }

    /// Moves the child nodes and resources of `other` into `layer` and
    /// deletes `other`.
    pub fn layer_merge(&mut self, layer: LayerId, other: LayerId) {
        assert_eq!(
            self.layer_data(layer).parent,
            self.layer_data(other).parent,
            "layer_merge: layers have different parents"
        );
        for child in self.layer_data(other).children.clone() {
            self.layer_add_child_node(layer, child);
        }
        for r in self.layer_data(other).resources.clone() {
            self.layer_add_resource(layer, r);
        }
        self.layer_delete(other);
    }

    /// True when every child node of `a` is a child node of `b`.
    pub fn layer_subset(&self, a: LayerId, b: LayerId) -> bool {
        let b_children = &self.layer_data(b).children;
        self.layer_data(a)
            .children
            .iter()
            .all(|c| b_children.contains(c))
    }

    /// True when `a` and `b` have the same child nodes.
    pub fn layer_equal(&self, a: LayerId, b: LayerId) -> bool {
        self.layer_subset(a, b) && self.layer_subset(b, a)
    }

    pub fn layer_duration(&self, layer: LayerId) -> usize {
        self.layer_data(layer)
            .children
            .iter()
            .map(|n| self.node_duration(*n))
            .sum()
    }

    pub fn layer_meet_count(&self, layer: LayerId) -> usize {
        self.layer_data(layer)
            .children
            .iter()
            .map(|n| self.node_meet_count(*n))
            .sum()
    }

    pub fn layer_assigned_duration(&self, layer: LayerId) -> usize {
        self.layer_data(layer)
            .children
            .iter()
            .map(|n| self.node_assigned_duration(*n))
            .sum()
    }

    pub fn layer_demand(&self, layer: LayerId) -> usize {
        self.layer_data(layer)
            .children
            .iter()
            .map(|n| self.node_demand(*n))
            .sum()
    }

    pub fn layer_visit_num(&self, layer: LayerId) -> usize {
        self.layer_data(layer).visit_num
    }

    pub fn layer_set_visit_num(&mut self, layer: LayerId, visit_num: usize) {
        let prev = std::mem::replace(&mut self.layer_data_mut(layer).visit_num, visit_num);
        self.log(UndoOp::LayerSetVisitNum(layer, prev));
    }

    /// Makes a child layer of `parent` holding each child node whose
    /// subtree contains a meet with a task preassigned `r`.
    pub fn layer_make_from_resource(&mut self, parent: NodeId, r: ResourceId) -> LayerId {
        let layer = self.layer_make(parent);
        self.layer_add_resource(layer, r);
        let meets: Vec<_> = self
            .instance()
            .resource_layer_events(r)
            .iter()
            .flat_map(|e| self.event_meets(*e).iter().copied())
            .collect();
        for meet in meets {
            let mut node = self.meet_data(meet).node;
            while let Some(n) = node {
                match self.node_data(n).parent {
                    Some(p) if p == parent => {
                        self.layer_add_child_node(layer, n);
                        break;
                    }
                    p => node = p,
                }
            }
        }
        layer
    }

    pub fn node_child_layers(&self, node: NodeId) -> &[LayerId] {
        &self.node_data(node).child_layers
    }

    pub fn node_parent_layers(&self, node: NodeId) -> &[LayerId] {
        &self.node_data(node).parent_layers
    }

    /// Makes the child layers of `parent`: one per resource, with equal
    /// layers merged and empty ones dropped, plus a singleton layer for
    /// each child node that lies in no other layer.
    pub fn node_child_layers_make(&mut self, parent: NodeId) {
        self.node_child_layers_delete(parent);
        let resources: Vec<_> = self.instance().resources().collect();
        for r in resources {
            let layer = self.layer_make_from_resource(parent, r);
            if self.layer_data(layer).children.is_empty() {
                self.layer_delete(layer);
                continue;
            }
            let existing = self.node_data(parent).child_layers.iter().copied().find(|l| {
                *l != layer && self.layer_equal(*l, layer)
            });
            if let Some(l) = existing {
                self.layer_merge(l, layer);
            }
        }
        for child in self.node_data(parent).children.clone() {
            if self.node_data(child).parent_layers.is_empty() {
                let layer = self.layer_make(parent);
                self.layer_add_child_node(layer, child);
            }
        }
        tracing::trace!(
            node = %parent,
            layers = self.node_data(parent).child_layers.len(),
            "made child layers"
        );
    }

    pub fn node_child_layers_delete(&mut self, parent: NodeId) {
        while let Some(&layer) = self.node_data(parent).child_layers.last() {
            self.layer_delete(layer);
        }
    }

    /// Sorts the child layers of `parent` with `cmp`.
    pub fn node_child_layers_sort(
        &mut self,
        parent: NodeId,
        mut cmp: impl FnMut(&Soln, LayerId, LayerId) -> Ordering,
    ) {
        let prev = self.node_data(parent).child_layers.clone();
        let mut sorted = prev.clone();
        sorted.sort_by(|a, b| cmp(self, *a, *b));
        if sorted != prev {
            self.node_data_mut(parent).child_layers = sorted;
            self.log(UndoOp::NodeSetChildLayers(parent, prev));
        }
    }
}
