//! Layered time assignment.
//!
//! The child nodes of a node are grouped into layers, one per resource, and
//! the layers are assigned one at a time, hardest first. Hardness follows
//! the saturation degree heuristic: long layers with few, already partly
//! assigned meets come first, then layers of high demand. After each layer
//! is assigned it is repaired, and the remaining layers are sorted again.

use std::cmp::Ordering;

use khe_config::SolveOptions;
use khe_model::{LayerId, NodeId, Soln};
use tracing::{debug, trace};

use crate::basic::{node_all_child_meets_assigned, simple_assign};
use crate::parallel_assign::layer_parallel_assign_times;
use crate::repair::layer_repair_times;
use crate::time_solver::TimeSolver;

/// Layer-by-layer assignment with repair.
///
/// See [`node_layered_assign_times`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredAssign;

impl TimeSolver for LayeredAssign {
    fn solve(&self, soln: &mut Soln, node: NodeId, options: &SolveOptions) -> bool {
        node_layered_assign_times(soln, node, options)
    }
}

/// Layers whose demands differ by less than this are not ordered by demand
/// when diversifying.
const DEMAND_BAND: usize = 6;

fn layer_value(soln: &Soln, layer: LayerId) -> usize {
    3 * soln.layer_duration(layer) - soln.layer_meet_count(layer)
        + soln.layer_assigned_duration(layer)
}

fn layer_index(soln: &Soln, layer: LayerId) -> usize {
    let parent = soln.layer_parent(layer);
    soln.node_child_layers(parent)
        .iter()
        .position(|l| *l == layer)
        .unwrap_or(usize::MAX)
}

/// Visited layers first, then decreasing value, then decreasing demand,
/// then current position.
fn layer_cmp(soln: &Soln, a: LayerId, b: LayerId) -> Ordering {
    soln.layer_visit_num(b)
        .cmp(&soln.layer_visit_num(a))
        .then_with(|| layer_value(soln, b).cmp(&layer_value(soln, a)))
        .then_with(|| soln.layer_demand(b).cmp(&soln.layer_demand(a)))
        .then_with(|| layer_index(soln, a).cmp(&layer_index(soln, b)))
}

/// As [`layer_cmp`], except that demands are compared in bands and ties
/// are broken by position rotated by the diversifier.
fn layer_diversify_cmp(soln: &Soln, a: LayerId, b: LayerId) -> Ordering {
    let count = soln.node_child_layers(soln.layer_parent(a)).len().max(1);
    let shift = soln.diversifier() as usize % count;
    let rotated = |l: LayerId| (layer_index(soln, l) + count - shift) % count;
    soln.layer_visit_num(b)
        .cmp(&soln.layer_visit_num(a))
        .then_with(|| layer_value(soln, b).cmp(&layer_value(soln, a)))
        .then_with(|| {
            let band = |l: LayerId| soln.layer_demand(l) / DEMAND_BAND;
            band(b).cmp(&band(a))
        })
        .then_with(|| rotated(a).cmp(&rotated(b)))
}

fn sort_layers(soln: &mut Soln, parent: NodeId, diversify: bool) {
    if diversify {
        soln.node_child_layers_sort(parent, layer_diversify_cmp);
    } else {
        soln.node_child_layers_sort(parent, layer_cmp);
    }
}

/// Assigns the unassigned child meets of the nodes of `layer`, largest
/// first, each to its best position in the parent's meets.
fn layer_assign(soln: &mut Soln, layer: LayerId) -> bool {
    let parent = soln.layer_parent(layer);
    let children = soln.layer_children(layer).to_vec();
    simple_assign(soln, parent, &children)
}

fn layer_repair(soln: &mut Soln, layer: LayerId, options: &SolveOptions) {
    if options.time_layer_repair {
        layer_repair_times(soln, layer, options);
    }
}

/// Assigns times to the meets of the child nodes of `parent`, layer by
/// layer, and returns true when every child meet ended up assigned.
///
/// Child layers are made first if `parent` has none, and deleted again at
/// the end. With `time_node_regularity`, the first layer is assigned in
/// parallel with any assignments already present in its sibling layers.
/// The first layer is repaired without a vizier node; the others with
/// whatever `options` ask for.
pub fn node_layered_assign_times(
    soln: &mut Soln,
    parent: NodeId,
    options: &SolveOptions,
) -> bool {
    let added_layers = soln.node_child_layers(parent).is_empty();
    if added_layers {
        soln.node_child_layers_make(parent);
    }
    sort_layers(soln, parent, options.diversify);
    let first_options = options.clone().with_vizier_node(false);

    let mut i = 0;
    while i < soln.node_child_layers(parent).len() {
        let layer = soln.node_child_layers(parent)[i];
        if i == 0 {
            if options.time_node_regularity {
                layer_parallel_assign_times(soln, layer, options);
            }
            layer_assign(soln, layer);
            layer_repair(soln, layer, &first_options);
        } else if soln.layer_assigned_duration(layer) >= soln.layer_duration(layer) {
            layer_repair(soln, layer, options);
        } else {
            layer_assign(soln, layer);
            layer_repair(soln, layer, options);
        }
        soln.layer_set_visit_num(layer, 1);
        trace!(%layer, index = i, cost = %soln.cost(), "layer assigned");
        sort_layers(soln, parent, options.diversify);
        i += 1;
    }

    if added_layers {
        soln.node_child_layers_delete(parent);
    }
    let res = node_all_child_meets_assigned(soln, parent);
    debug!(node = %parent, res, cost = %soln.cost(), "node layered assign times");
    res
}

#[cfg(test)]
#[path = "layered_tests.rs"]
mod tests;
