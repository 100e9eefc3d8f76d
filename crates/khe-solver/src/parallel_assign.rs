//! Parallel assignment of a layer to its sibling layers' assignments.
//!
//! Before a first layer is assigned, each already-assigned child node of a
//! sibling layer is matched with a node of the layer of equal duration, and
//! the layer node's meets take the same targets and offsets. Nodes running
//! in parallel like this keep the timetable regular.

use std::cmp::Reverse;

use khe_config::SolveOptions;
use khe_model::{LayerId, MeetId, NodeId, Soln};
use tracing::{debug, trace};

fn node_assigned_meet_count(soln: &Soln, node: NodeId) -> usize {
    soln.node_meets(node)
        .iter()
        .filter(|m| soln.meet_asst(**m).is_some())
        .count()
}

fn layer_assigned_meet_count(soln: &Soln, layer: LayerId) -> usize {
    soln.layer_children(layer)
        .iter()
        .map(|c| node_assigned_meet_count(soln, *c))
        .sum()
}

/// True when the assigned `a` and `b` share a target and overlap in it.
fn meets_overlap(soln: &Soln, a: MeetId, b: MeetId) -> bool {
    match (soln.meet_asst_pair(a), soln.meet_asst_pair(b)) {
        (Some((ta, oa)), Some((tb, ob))) => {
            ta == tb && oa < ob + soln.meet_duration(b) && ob < oa + soln.meet_duration(a)
        }
        _ => false,
    }
}

fn nodes_overlap(soln: &Soln, a: NodeId, b: NodeId) -> bool {
    soln.node_meets(a)
        .iter()
        .any(|ma| soln.node_meets(b).iter().any(|mb| meets_overlap(soln, *ma, *mb)))
}

/// Matches each assigned meet of `other` with a distinct meet of
/// `layer_node`: one assigned identically if there is one, otherwise an
/// unassigned meet of equal duration that could take the same assignment.
///
/// Returns the matched meets in the order of `other`'s assigned meets, or
/// `None` when the nodes are the same, differ in duration, or some meet
/// finds no partner.
fn node_matches(soln: &Soln, layer_node: NodeId, other: NodeId) -> Option<Vec<MeetId>> {
    if layer_node == other || soln.node_duration(layer_node) != soln.node_duration(other) {
        return None;
    }
    let mut matched: Vec<MeetId> = Vec::new();
    for other_meet in soln.node_meets(other) {
        let Some((target, offset)) = soln.meet_asst_pair(*other_meet) else {
            continue;
        };
        let duration = soln.meet_duration(*other_meet);
        let candidates = soln.node_meets(layer_node);
        let same = candidates.iter().find(|m| {
            !matched.contains(*m)
                && soln.meet_asst_pair(**m) == Some((target, offset))
                && soln.meet_duration(**m) == duration
        });
        let free = || {
            candidates.iter().find(|m| {
                !matched.contains(*m)
                    && soln.meet_asst(**m).is_none()
                    && soln.meet_duration(**m) == duration
                    && soln.meet_assign_check(**m, target, offset)
            })
        };
        let found = same.or_else(free)?;
        matched.push(*found);
    }
    Some(matched)
}

/// Gives the unassigned meets of `matched` the assignments of the assigned
/// meets of `other`, pairwise.
fn node_match(soln: &mut Soln, other: NodeId, matched: &[MeetId]) {
    let assigned: Vec<(MeetId, usize)> = soln
        .node_meets(other)
        .iter()
        .filter_map(|m| soln.meet_asst_pair(*m))
        .collect();
    for (layer_meet, (target, offset)) in matched.iter().zip(assigned) {
        if soln.meet_asst(*layer_meet).is_none() {
            let ok = soln.meet_assign(*layer_meet, target, offset);
            assert!(ok, "node_match: checked assignment failed");
            trace!(meet = %layer_meet, %target, offset, "parallel assignment");
        }
    }
}

/// Tries to run a node of `layer` in parallel with `child`, which has at
/// least one assigned meet.
fn node_parallel_assign(soln: &mut Soln, child: NodeId, layer: LayerId) -> bool {
    let layer_nodes = soln.layer_children(layer).to_vec();
    let overlapping: Vec<NodeId> = layer_nodes
        .iter()
        .copied()
        .filter(|n| nodes_overlap(soln, *n, child))
        .collect();

    match overlapping.as_slice() {
        [] => {
            // any matching node will do; prefer short, then little assigned
            let best = layer_nodes
                .iter()
                .filter_map(|n| node_matches(soln, *n, child).map(|m| (*n, m)))
                .min_by_key(|(n, _)| {
                    (soln.node_duration(*n), node_assigned_meet_count(soln, *n))
                });
            match best {
                Some((_, matched)) => {
                    node_match(soln, child, &matched);
                    true
                }
                None => false,
            }
        }
        [node] => match node_matches(soln, *node, child) {
            Some(matched) => {
                node_match(soln, child, &matched);
                true
            }
            None => false,
        },
        // already spans two nodes of the layer
        _ => false,
    }
}

/// Assigns meets of `layer` so that they run in parallel with the
/// assigned meets of its sibling layers, as far as possible.
///
/// Sibling layers are visited in decreasing order of assigned meet count.
/// Returns true when every assigned child node of every sibling layer was
/// matched.
pub fn layer_parallel_assign_times(
    soln: &mut Soln,
    layer: LayerId,
    _options: &SolveOptions,
) -> bool {
    let parent = soln.layer_parent(layer);
    let mut siblings: Vec<(usize, usize, LayerId)> = soln
        .node_child_layers(parent)
        .iter()
        .enumerate()
        .filter(|(_, l)| **l != layer)
        .map(|(i, l)| (layer_assigned_meet_count(soln, *l), i, *l))
        .collect();
    siblings.sort_by_key(|(count, i, _)| (Reverse(*count), *i));

    let mut res = true;
    for (_, _, sibling) in siblings {
        for child in soln.layer_children(sibling).to_vec() {
            if node_assigned_meet_count(soln, child) > 0 {
                res &= node_parallel_assign(soln, child, layer);
            }
        }
    }
    debug!(%layer, res, "layer parallel assign times");
    res
}

#[cfg(test)]
#[path = "parallel_assign_tests.rs"]
mod tests;
