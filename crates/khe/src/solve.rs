//! Time assignment entry points.

use std::sync::Arc;

use khe_config::SolveOptions;
use khe_model::{Instance, Soln};
use khe_solver::{
    build_runarounds, kempe_demand_group_monitor_make, node_all_child_meets_assigned,
    node_layered_assign_times, node_preassigned_assign_times, node_recursive_assign_times,
    node_repair_times, parallel_solve, try_meet_unassignments, workload_requirements,
    RunaroundAssign, SimpleAssign,
};
use tracing::{debug, info};

/// Assigns times to the meets below the cycle node of `soln`.
///
/// In order: workload requirements and the Kempe demand group monitor are
/// installed; with `time_runarounds`, runarounds are built below the cycle
/// node and the subtree of each cycle child is assigned bottom up; meets
/// with a single-time domain are assigned; the cycle node's children are
/// assigned layer by layer; with `time_layer_repair`, the whole cycle node
/// is repaired once more; finally unassignments that reduce cost are kept.
///
/// Returns true when every child meet of the cycle node is assigned.
///
/// # Panics
///
/// Panics if a mark is open.
pub fn assign_times(soln: &mut Soln, options: &SolveOptions) -> bool {
    assert!(!soln.mark_is_open(), "assign_times: mark is open");
    let cycle = soln.cycle_node();
    info!(
        instance = soln.instance().name(),
        diversifier = soln.diversifier(),
        cost = %soln.cost(),
        "assign times"
    );

    workload_requirements(soln);
    kempe_demand_group_monitor_make(soln);

    if options.time_runarounds {
        let made = build_runarounds(soln, cycle, &SimpleAssign, &RunaroundAssign, options);
        debug!(made, "built runarounds");
        for child in soln.node_children(cycle).to_vec() {
            if soln.node_child_count(child) > 0 {
                node_recursive_assign_times(soln, child, &RunaroundAssign, options);
            }
        }
    }

    node_preassigned_assign_times(soln, cycle);
    node_layered_assign_times(soln, cycle, options);
    if options.time_layer_repair {
        node_repair_times(soln, cycle, options);
    }
    try_meet_unassignments(soln);

    let res = node_all_child_meets_assigned(soln, cycle);
    info!(res, cost = %soln.cost(), "assign times finished");
    res
}

/// Solves `options.attempts` fresh solutions of `instance` in parallel and
/// returns the `options.keep_best` cheapest, cheapest first.
///
/// Each solution gets event meets and event nodes, then [`assign_times`].
pub fn solve(instance: &Arc<Instance>, options: &SolveOptions) -> Vec<Soln> {
    parallel_solve(
        instance,
        options.diversifier,
        options.attempts,
        options.thread_count,
        options.keep_best,
        |soln| {
            soln.make_event_meets();
            soln.make_event_nodes();
            assign_times(soln, options);
        },
    )
}

#[cfg(test)]
#[path = "solve_tests.rs"]
mod tests;
