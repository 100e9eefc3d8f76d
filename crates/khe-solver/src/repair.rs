//! Layer and node repair.
//!
//! A hill climber over the child meets of a layer or node. Each meet is
//! offered every position in the parent's meets through the configured
//! repair move, under a mark; a move stays only when it lowers the cost.
//! Passes repeat until one makes no improvement or the pass limit is hit.

use khe_config::{RepairMove, SolveOptions};
use khe_model::{LayerId, MeetId, MonitorTag, NodeId, Soln};
use tracing::{debug, trace};

use crate::kempe::{
    basic_meet_move, ejecting_meet_move, kempe_demand_group_monitor_make, kempe_meet_move,
    KempeFailure, KempeMove,
};

/// Makes the Kempe demand group monitor unless some preassigned task's
/// demand node already belongs to one.
fn ensure_kempe_group(soln: &mut Soln) {
    let dn = soln
        .tasks()
        .filter(|t| soln.task_preassigned(*t).is_some())
        .find_map(|t| soln.task_demand_nodes(t).first().copied());
    if let Some(dn) = dn {
        if soln.demand_group_monitor(dn, MonitorTag::KempeDemand).is_none() {
            kempe_demand_group_monitor_make(soln);
        }
    }
}

fn repair_move(
    soln: &mut Soln,
    kind: RepairMove,
    meet: MeetId,
    target: MeetId,
    offset: usize,
    preserve_regularity: bool,
) -> Result<KempeMove, KempeFailure> {
    match kind {
        RepairMove::Kempe if soln.meet_asst(meet).is_some() => {
            kempe_meet_move(soln, meet, target, offset, preserve_regularity, None)
        }
        RepairMove::Kempe | RepairMove::Basic => {
            basic_meet_move(soln, meet, target, offset, preserve_regularity)
        }
        RepairMove::Ejecting => {
            ejecting_meet_move(soln, meet, target, offset, preserve_regularity)
        }
    }
}

/// Tries every position of `meet` in `targets`, keeping the first move
/// that reduces the cost.
fn improve_meet(
    soln: &mut Soln,
    meet: MeetId,
    targets: &[MeetId],
    kind: RepairMove,
    preserve_regularity: bool,
) -> bool {
    if soln.meet_is_fixed(meet) {
        return false;
    }
    let duration = soln.meet_duration(meet);
    for target in targets {
        let target_duration = soln.meet_duration(*target);
        if duration > target_duration {
            continue;
        }
        for offset in 0..=target_duration - duration {
            if soln.meet_asst_pair(meet) == Some((*target, offset)) {
                continue;
            }
            let mark = soln.mark_begin();
            let res = repair_move(soln, kind, meet, *target, offset, preserve_regularity);
            if res.is_ok() && soln.cost() < mark.cost() {
                trace!(%meet, %target, offset, to = %soln.cost(), "repair move");
                soln.mark_end(mark, false);
                return true;
            }
            soln.mark_end(mark, true);
        }
    }
    false
}

/// Runs improving passes over `meets` with targets `targets`.
fn repair_meets(
    soln: &mut Soln,
    meets: &[MeetId],
    targets: &[MeetId],
    options: &SolveOptions,
) -> bool {
    let kind = options.repair_move();
    let mut improved = false;
    for pass in 0..options.repair_max_passes {
        let mut any = false;
        for meet in meets {
            any |= improve_meet(soln, *meet, targets, kind, options.time_node_regularity);
        }
        trace!(pass, any, cost = %soln.cost(), "repair pass");
        if !any {
            break;
        }
        improved = true;
    }
    improved
}

fn child_meets(soln: &Soln, children: &[NodeId]) -> Vec<MeetId> {
    children
        .iter()
        .flat_map(|c| soln.node_meets(*c).iter().copied())
        .collect()
}

/// Repairs `children`, which lie below `parent`. With a vizier node, the
/// children are repaired against the vizier's meets, then the vizier's
/// meets are repaired against the parent's, moving whole blocks.
fn repair(soln: &mut Soln, parent: NodeId, children: &[NodeId], options: &SolveOptions) -> bool {
    if options.repair_move() == RepairMove::Kempe {
        ensure_kempe_group(soln);
    }
    let meets = child_meets(soln, children);
    if !options.ejector_vizier_node {
        let targets = soln.node_meets(parent).to_vec();
        return repair_meets(soln, &meets, &targets, options);
    }

    let vizier = soln.node_vizier_make(parent);
    let vizier_meets = soln.node_meets(vizier).to_vec();
    let mut res = repair_meets(soln, &meets, &vizier_meets, options);
    let targets = soln.node_meets(parent).to_vec();
    res |= repair_meets(soln, &vizier_meets, &targets, options);
    soln.node_vizier_delete(vizier);
    res
}

/// Repairs the child meets of the nodes of `layer`. Returns true when the
/// cost went down.
pub fn layer_repair_times(soln: &mut Soln, layer: LayerId, options: &SolveOptions) -> bool {
    let init_cost = soln.cost();
    let parent = soln.layer_parent(layer);
    let children = soln.layer_children(layer).to_vec();
    let res = repair(soln, parent, &children, options);
    debug!(%layer, res, from = %init_cost, to = %soln.cost(), "layer repair times");
    res
}

/// Repairs the child meets of every child node of `node`. Returns true
/// when the cost went down.
pub fn node_repair_times(soln: &mut Soln, node: NodeId, options: &SolveOptions) -> bool {
    let init_cost = soln.cost();
    let children = soln.node_children(node).to_vec();
    let res = repair(soln, node, &children, options);
    debug!(%node, res, from = %init_cost, to = %soln.cost(), "node repair times");
    res
}

#[cfg(test)]
#[path = "repair_tests.rs"]
mod tests;
