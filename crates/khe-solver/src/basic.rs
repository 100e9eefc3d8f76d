//! Basic time assignment.
//!
//! Greedy best-cost assignment of child meets into a parent node's meets,
//! recursive application of a time solver over a node tree, assignment of
//! meets whose domain allows one time only, and a pass that keeps any
//! unassignment that reduces cost.

use khe_config::SolveOptions;
use khe_core::Cost;
use khe_model::{LayerId, MeetId, NodeId, Soln, TimeId};
use tracing::{debug, trace};

use crate::time_solver::TimeSolver;

/// True when no meet of the event of `meet` is already assigned to `target`.
fn allow_asst(soln: &Soln, meet: MeetId, target: MeetId) -> bool {
    match soln.meet_event(meet) {
        Some(e) => soln
            .event_meets(e)
            .iter()
            .all(|m| soln.meet_asst(*m) != Some(target)),
        None => true,
    }
}

/// Assigns the unassigned `meet` to the (meet of `parent`, offset) pair
/// giving the lowest solution cost. Ties go to the first pair tried.
fn make_best_asst(soln: &mut Soln, meet: MeetId, parent: NodeId) -> bool {
    debug_assert!(soln.meet_asst(meet).is_none());
    let duration = soln.meet_duration(meet);
    let mut best: Option<(MeetId, usize, Cost)> = None;
    for target in soln.node_meets(parent).to_vec() {
        if !allow_asst(soln, meet, target) {
            continue;
        }
        let target_duration = soln.meet_duration(target);
        if duration > target_duration {
            continue;
        }
        for offset in 0..=target_duration - duration {
            if soln.meet_assign(meet, target, offset) {
                let cost = soln.cost();
                if best.map_or(true, |(_, _, c)| cost < c) {
                    best = Some((target, offset, cost));
                }
                soln.meet_unassign(meet);
            }
        }
    }
    match best {
        Some((target, offset, cost)) => {
            let assigned = soln.meet_assign(meet, target, offset);
            assert!(assigned, "make_best_asst: best assignment no longer allowed");
            trace!(%meet, %target, offset, %cost, "best assignment");
            true
        }
        None => false,
    }
}

pub(crate) fn simple_assign(soln: &mut Soln, parent: NodeId, children: &[NodeId]) -> bool {
    let meets: Vec<MeetId> = children
        .iter()
        .flat_map(|c| soln.node_meets(*c).iter().copied())
        .collect();
    let max_duration = meets
        .iter()
        .map(|m| soln.meet_duration(*m))
        .max()
        .unwrap_or(0);
    let mut res = true;
    for duration in (1..=max_duration).rev() {
        for meet in &meets {
            if soln.meet_duration(*meet) == duration && soln.meet_asst(*meet).is_none() {
                res &= make_best_asst(soln, *meet, parent);
            }
        }
    }
    res
}

/// Unassigns the meets of the child nodes of `parent`, then assigns them
/// again, largest first, each to the best position among the meets of
/// `parent`.
///
/// Returns true when every child meet is assigned. Meets that could not be
/// assigned are left unassigned; the others keep their assignments.
pub fn node_simple_assign_times(soln: &mut Soln, parent: NodeId) -> bool {
    node_unassign_times(soln, parent);
    let children = soln.node_children(parent).to_vec();
    let res = simple_assign(soln, parent, &children);
    debug!(node = %parent, res, cost = %soln.cost(), "node simple assign times");
    res
}

/// As [`node_simple_assign_times`], over the child nodes of one layer.
pub fn layer_simple_assign_times(soln: &mut Soln, layer: LayerId) -> bool {
    layer_unassign_times(soln, layer);
    let parent = soln.layer_parent(layer);
    let children = soln.layer_children(layer).to_vec();
    let res = simple_assign(soln, parent, &children);
    debug!(%layer, res, cost = %soln.cost(), "layer simple assign times");
    res
}

/// Applies `solver` to every proper descendant of `node` in postorder, then
/// to `node` itself. Every call is made; the result is their conjunction.
pub fn node_recursive_assign_times(
    soln: &mut Soln,
    node: NodeId,
    solver: &dyn TimeSolver,
    options: &SolveOptions,
) -> bool {
    let mut res = true;
    for child in soln.node_children(node).to_vec() {
        res &= node_recursive_assign_times(soln, child, solver, options);
    }
    res &= solver.solve(soln, node, options);
    res
}

fn preassigned_assign(soln: &mut Soln, children: &[NodeId]) -> bool {
    let mut res = true;
    for child in children {
        for meet in soln.node_meets(*child).to_vec() {
            if soln.meet_asst(meet).is_some() {
                continue;
            }
            let t = match soln.meet_domain(meet) {
                Some(d) if d.len() == 1 => d.first(),
                _ => None,
            };
            if let Some(t) = t {
                if !soln.meet_assign_time(meet, TimeId::new(t)) {
                    res = false;
                }
            }
        }
    }
    res
}

/// Assigns each unassigned meet of the children of `root` whose domain holds
/// exactly one time to that time. Keeps going after failures; returns true
/// when none failed.
pub fn node_preassigned_assign_times(soln: &mut Soln, root: NodeId) -> bool {
    let children = soln.node_children(root).to_vec();
    let res = preassigned_assign(soln, &children);
    debug!(node = %root, res, "node preassigned assign times");
    res
}

/// As [`node_preassigned_assign_times`], over the child nodes of one layer.
pub fn layer_preassigned_assign_times(soln: &mut Soln, layer: LayerId) -> bool {
    let children = soln.layer_children(layer).to_vec();
    preassigned_assign(soln, &children)
}

/// Tries unassigning each assigned meet whose event has no preassigned
/// time, keeping the unassignment when it reduces cost.
///
/// Returns true when at least one unassignment was kept.
pub fn try_meet_unassignments(soln: &mut Soln) -> bool {
    let mut res = false;
    for meet in soln.meets().collect::<Vec<_>>() {
        let Some((target, offset)) = soln.meet_asst_pair(meet) else {
            continue;
        };
        if soln.meet_is_preassigned(meet).is_some() {
            continue;
        }
        let cost = soln.cost();
        if !soln.meet_unassign(meet) {
            continue;
        }
        if soln.cost() < cost {
            debug!(%meet, from = %cost, to = %soln.cost(), "kept unassignment");
            res = true;
        } else {
            let reassigned = soln.meet_assign(meet, target, offset);
            debug_assert!(reassigned);
        }
    }
    res
}

fn unassign_meets(soln: &mut Soln, children: &[NodeId]) -> bool {
    for child in children {
        for meet in soln.node_meets(*child).to_vec() {
            if soln.meet_asst(meet).is_some() && !soln.meet_unassign(meet) {
                return false;
            }
        }
    }
    true
}

/// Unassigns every assigned meet of the child nodes of `parent`, stopping
/// at the first that cannot be unassigned.
pub fn node_unassign_times(soln: &mut Soln, parent: NodeId) -> bool {
    let children = soln.node_children(parent).to_vec();
    unassign_meets(soln, &children)
}

pub fn layer_unassign_times(soln: &mut Soln, layer: LayerId) -> bool {
    let children = soln.layer_children(layer).to_vec();
    unassign_meets(soln, &children)
}

fn all_assigned(soln: &Soln, children: &[NodeId]) -> bool {
    children.iter().all(|c| {
        soln.node_meets(*c)
            .iter()
            .all(|m| soln.meet_asst(*m).is_some())
    })
}

pub fn node_all_child_meets_assigned(soln: &Soln, parent: NodeId) -> bool {
    all_assigned(soln, soln.node_children(parent))
}

pub fn layer_all_child_meets_assigned(soln: &Soln, layer: LayerId) -> bool {
    all_assigned(soln, soln.layer_children(layer))
}

#[cfg(test)]
#[path = "basic_tests.rs"]
mod tests;
