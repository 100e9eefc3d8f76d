//! Tests for the solution model.

use khe_core::Cost;

use super::*;
use crate::ids::{ConstraintId, EventId, ResourceId};
use crate::instance::ConstraintKind;
use crate::test_utils::{school, school_builder, soln_of, time, times};

fn event_meet(soln: &Soln, e: usize) -> MeetId {
    soln.event_meets(EventId::new(e))[0]
}

fn all_demand_assts(soln: &Soln) -> Vec<Option<(ResourceId, TimeId)>> {
    (0..soln.demand_count())
        .map(|i| soln.demand_asst(crate::ids::DemandId::new(i)))
        .collect()
}

#[test]
fn test_new_soln_has_one_cycle_meet_per_block() {
    let mut b = school_builder(3, 0, &[]);
    b.add_break();
    b.add_times("U", 2);
    let instance = std::sync::Arc::new(b.build().unwrap());
    let soln = Soln::new(instance, 7);
    assert_eq!(soln.cycle_meets().len(), 2);
    assert_eq!(soln.diversifier(), 7);
    let second = soln.cycle_meets()[1];
    assert!(soln.meet_is_cycle_meet(second));
    assert_eq!(soln.meet_duration(second), 2);
    assert_eq!(soln.node_meets(soln.cycle_node()), soln.cycle_meets());
    assert_eq!(soln.time_cycle_meet(time(4)), (second, 1));
}

#[test]
fn test_unassigned_event_meets_cost_assign_time() {
    let soln = soln_of(school(6, 1, &[(2, Some(0)), (3, Some(0))]));
    assert_eq!(soln.time_cost(), Cost::of_hard(5));
    assert_eq!(soln.matching_cost(), Cost::ZERO);
    assert_eq!(soln.demand_count(), 5);
    assert_eq!(soln.meet_demand(event_meet(&soln, 1)), 3);
}

#[test]
fn test_assign_grounds_meet_and_clears_time_cost() {
    let mut soln = soln_of(school(6, 1, &[(2, Some(0))]));
    let meet = event_meet(&soln, 0);
    let cycle = soln.cycle_meets()[0];
    assert!(soln.meet_assign(meet, cycle, 3));
    assert_eq!(soln.meet_asst_time(meet), Some(time(3)));
    assert_eq!(soln.cost(), Cost::ZERO);
    let dn = soln.task_demand_nodes(soln.meet_tasks(meet)[0])[1];
    assert_eq!(soln.demand_asst(dn), Some((ResourceId::new(0), time(4))));
}

#[test]
fn test_move_check_rules() {
    let instance = {
        let mut b = school_builder(6, 0, &[(2, None), (1, None)]);
        b.add_event("Fixed", 1, Some(time(1)));
        std::sync::Arc::new(b.build().unwrap())
    };
    let mut soln = soln_of(instance);
    let cycle = soln.cycle_meets()[0];
    let a = event_meet(&soln, 0);
    let pre = event_meet(&soln, 2);

    // cycle meets never move
    assert!(!soln.meet_move_check(cycle, None));
    // unassigning an unassigned meet fails
    assert!(!soln.meet_move_check(a, None));
    // offset out of range
    assert!(!soln.meet_move_check(a, Some((cycle, 5))));
    assert!(soln.meet_move(a, Some((cycle, 4))));
    // no change
    assert!(!soln.meet_move_check(a, Some((cycle, 4))));
    // domain {1}
    assert!(!soln.meet_assign_time(pre, time(0)));
    assert!(soln.meet_assign_time(pre, time(1)));
    // fixed
    soln.meet_assign_fix(pre);
    assert!(!soln.meet_unassign(pre));
    soln.meet_assign_unfix(pre);
    assert!(soln.meet_unassign(pre));
}

#[test]
fn test_node_rule() {
    let mut soln = soln_of(school(6, 0, &[(1, None)]));
    let cycle = soln.cycle_meets()[0];
    let meet = event_meet(&soln, 0);
    let orphan = soln.node_make();
    soln.node_add_meet(orphan, meet);
    // node has no parent
    assert!(!soln.meet_assign(meet, cycle, 0));
    assert!(soln.node_add_parent(orphan, soln.cycle_node()));
    assert!(soln.meet_assign(meet, cycle, 0));
}

#[test]
fn test_assignment_must_stay_acyclic() {
    let mut soln = soln_of(school(6, 0, &[]));
    let a = soln.meet_make(2);
    let b = soln.meet_make(1);
    assert!(soln.meet_assign(b, a, 0));
    assert!(!soln.meet_assign(a, b, 0));
    assert!(!soln.meet_assign(a, a, 0));
}

#[test]
fn test_automatic_domain_consults_assigned_meets() {
    let mut soln = soln_of(school(6, 0, &[]));
    let cycle = soln.cycle_meets()[0];
    let outer = soln.meet_make(3);
    let inner = soln.meet_make_with_domain(1, times(&[1, 2]));
    assert!(soln.meet_domain(outer).is_none());
    // inner lands at 1 relative to outer; outer unassigned so anything goes
    assert!(soln.meet_assign(inner, outer, 1));
    // outer at 0 puts inner at 1; outer at 2 puts inner at 3
    assert!(soln.meet_assign_check(outer, cycle, 0));
    assert!(!soln.meet_assign_check(outer, cycle, 2));
    assert!(soln.meet_assign(outer, cycle, 1));
    assert_eq!(soln.meet_asst_time(inner), Some(time(2)));
}

#[test]
fn test_meet_bound_narrows_domain() {
    let mut soln = soln_of(school(6, 0, &[(1, None)]));
    let meet = event_meet(&soln, 0);
    let group = soln.meet_bound_group_make();
    let bound = soln.meet_bound_make(group, times(&[0, 1, 2]));
    assert!(soln.meet_assign_time(meet, time(4)));
    // current assignment would become illegal
    assert!(!soln.meet_add_meet_bound(meet, bound));
    assert!(soln.meet_move_time(meet, time(2)));
    assert!(soln.meet_add_meet_bound(meet, bound));
    assert_eq!(soln.meet_domain(meet), Some(times(&[0, 1, 2])));
    assert!(!soln.meet_move_time(meet, time(4)));
    soln.meet_bound_group_delete(group);
    assert!(soln.meet_bounds(meet).is_empty());
    assert!(soln.meet_move_time(meet, time(4)));
}

#[test]
fn test_clash_leaves_demand_unmatched() {
    let mut soln = soln_of(school(6, 1, &[(2, Some(0)), (2, Some(0))]));
    let cycle = soln.cycle_meets()[0];
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign(a, cycle, 0));
    assert!(soln.meet_assign(b, cycle, 1));
    // times 0..2 and 1..3 share time 1
    assert_eq!(soln.matching_cost(), Cost::of_hard(1));
    assert!(soln.meet_move(b, Some((cycle, 2))));
    assert_eq!(soln.cost(), Cost::ZERO);
}

#[test]
fn test_long_augmenting_paths_keep_matching_maximum() {
    let n = 64;
    let mut soln = soln_of(school(n, 1, &vec![(1, Some(0)); n]));
    assert_eq!(soln.matching_unmatched_count(), 0);
    let assts = all_demand_assts(&soln);

    // pinning meets to times in reverse forces the floating meets to
    // shift along paths through every other demand node
    let mark = soln.mark_begin();
    for e in (0..n).rev() {
        let meet = event_meet(&soln, e);
        assert!(soln.meet_assign_time(meet, time(n - 1 - e)));
        assert_eq!(soln.matching_unmatched_count(), 0);
        let dn = soln.task_demand_nodes(soln.meet_tasks(meet)[0])[0];
        assert_eq!(soln.demand_asst(dn), Some((ResourceId::new(0), time(n - 1 - e))));
    }
    assert_eq!(soln.cost(), Cost::ZERO);
    soln.mark_end(mark, true);

    assert_eq!(all_demand_assts(&soln), assts);
}

#[test]
fn test_competitors_include_clashing_owner() {
    let mut soln = soln_of(school(6, 1, &[(1, Some(0)), (1, Some(0))]));
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign_time(a, time(2)));
    assert!(soln.meet_assign_time(b, time(2)));
    let dn_a = soln.task_demand_nodes(soln.meet_tasks(a)[0])[0];
    let dn_b = soln.task_demand_nodes(soln.meet_tasks(b)[0])[0];
    let unmatched: Vec<_> = soln.matching_unmatched().collect();
    assert_eq!(unmatched.len(), 1);
    let loser = unmatched[0];
    let winner = if loser == dn_a { dn_b } else { dn_a };
    assert_eq!(soln.demand_competitors(loser), vec![loser, winner]);
}

#[test]
fn test_mark_undo_restores_state_exactly() {
    let mut soln = soln_of(school(6, 1, &[(2, Some(0)), (2, Some(0)), (1, None)]));
    let cycle = soln.cycle_meets()[0];
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign(a, cycle, 4));
    let cost = soln.cost();
    let assts = all_demand_assts(&soln);

    let mark = soln.mark_begin();
    assert!(soln.meet_move(a, Some((cycle, 0))));
    assert!(soln.meet_assign(b, cycle, 1));
    let node = soln.node_make();
    let extra = soln.meet_make(1);
    soln.node_add_meet(node, extra);
    assert_ne!(soln.cost(), cost);
    soln.mark_end(mark, true);

    assert_eq!(soln.cost(), cost);
    assert_eq!(soln.meet_asst_pair(a), Some((cycle, 4)));
    assert_eq!(soln.meet_asst_pair(b), None);
    assert!(!soln.meet_exists(extra));
    assert!(!soln.node_exists(node));
    assert_eq!(all_demand_assts(&soln), assts);
}

#[test]
fn test_with_mark_keeps_on_success() {
    let mut soln = soln_of(school(6, 0, &[(1, None)]));
    let meet = event_meet(&soln, 0);
    assert!(!soln.with_mark(|s| {
        s.meet_assign_time(meet, time(0));
        false
    }));
    assert_eq!(soln.meet_asst(meet), None);
    assert!(soln.with_mark(|s| s.meet_assign_time(meet, time(0))));
    assert_eq!(soln.meet_asst_time(meet), Some(time(0)));
    assert!(!soln.mark_is_open());
}

#[test]
#[should_panic(expected = "reverse order")]
fn test_marks_must_nest() {
    let mut soln = soln_of(school(2, 0, &[]));
    let outer = soln.mark_begin();
    let _inner = soln.mark_begin();
    soln.mark_end(outer, false);
}

#[test]
fn test_mark_undoes_group_membership() {
    let mut soln = soln_of(school(4, 1, &[(1, Some(0)), (1, Some(0))]));
    let dn_a = soln.task_demand_nodes(soln.meet_tasks(event_meet(&soln, 0))[0])[0];
    let dn_b = soln.task_demand_nodes(soln.meet_tasks(event_meet(&soln, 1))[0])[0];
    let group = soln.group_monitor_make(MonitorTag::Custom(1));
    soln.group_monitor_add_demand(group, dn_a);

    let mark = soln.mark_begin();
    soln.group_monitor_add_demand(group, dn_b);
    soln.group_monitor_add_demand(group, dn_a);
    assert_eq!(soln.demand_groups(dn_b), &[group]);
    soln.mark_end(mark, true);

    assert_eq!(soln.demand_groups(dn_a), &[group]);
    assert_eq!(soln.group_monitor_members(group), &[dn_a]);
    assert!(soln.demand_groups(dn_b).is_empty());
    assert_eq!(soln.demand_group_monitor(dn_b, MonitorTag::Custom(1)), None);
}

#[test]
fn test_trace_records_changed_members() {
    let mut soln = soln_of(school(4, 1, &[(1, Some(0)), (1, Some(0))]));
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign_time(a, time(0)));
    assert!(soln.meet_assign_time(b, time(1)));
    let group = soln.group_monitor_make(MonitorTag::KempeDemand);
    let dn_b = soln.task_demand_nodes(soln.meet_tasks(b)[0])[0];
    soln.group_monitor_add_demand(group, dn_b);
    assert_eq!(soln.demand_group_monitor(dn_b, MonitorTag::KempeDemand), Some(group));

    let mark = soln.mark_begin();
    soln.trace_begin(group);
    assert!(soln.meet_move_time(b, time(0)));
    let trace = soln.trace_end();
    assert_eq!(trace.monitor_count(), 1);
    assert_eq!(trace.monitor(0), dn_b);
    assert_eq!(trace.init_cost(0), Cost::ZERO);
    assert_eq!(trace.worsened(&soln).collect::<Vec<_>>(), vec![dn_b]);
    soln.mark_end(mark, true);
    assert_eq!(soln.group_monitor_cost(group), Cost::ZERO);
}

#[test]
fn test_avoid_unavailable_workload_node_absorbs_supply() {
    let mut soln = soln_of(school(6, 1, &[(2, Some(0))]));
    let r = ResourceId::new(0);
    soln.matching_begin_workload_requirements(r);
    soln.matching_add_workload_requirement(r, 0, times(&[3]), ConstraintId::new(0));
    soln.matching_end_workload_requirements(r);
    let wdn = soln.resource_workload_demand_nodes(r)[0];
    assert_eq!(soln.demand_asst(wdn), Some((r, time(3))));

    let meet = event_meet(&soln, 0);
    assert!(soln.meet_assign_time(meet, time(2)));
    assert_eq!(soln.matching_cost(), Cost::of_hard(1));
    let unmatched: Vec<_> = soln.matching_unmatched().collect();
    assert!(soln.demand_competitors(unmatched[0]).contains(&wdn));
}

#[test]
fn test_nested_workload_requirements_share_nodes() {
    let mut soln = soln_of(school(6, 1, &[]));
    let r = ResourceId::new(0);
    let c = ConstraintId::new(0);
    soln.matching_begin_workload_requirements(r);
    soln.matching_add_workload_requirement(r, 0, times(&[0]), c);
    soln.matching_add_workload_requirement(r, 2, times(&[0, 1, 2, 3]), c);
    soln.matching_end_workload_requirements(r);
    // one for {0}, then 4 - 2 - 1 for the enclosing set
    assert_eq!(soln.resource_workload_demand_nodes(r).len(), 2);
}

#[test]
fn test_prefer_times_cost() {
    let instance = {
        let mut b = school_builder(6, 0, &[(2, None)]);
        b.add_constraint(
            "prefer",
            false,
            3,
            ConstraintKind::PreferTimes {
                events: vec![EventId::new(0)],
                times: times(&[0, 1]),
            },
        );
        std::sync::Arc::new(b.build().unwrap())
    };
    let mut soln = soln_of(instance);
    let meet = event_meet(&soln, 0);
    assert_eq!(soln.cost(), Cost::ZERO);
    assert!(soln.meet_assign_time(meet, time(2)));
    assert_eq!(soln.cost(), Cost::of_soft(6));
    assert!(soln.meet_move_time(meet, time(1)));
    assert_eq!(soln.cost(), Cost::ZERO);
}

#[test]
fn test_node_irregularity_counts_extra_zones() {
    let mut soln = soln_of(school(6, 0, &[(1, None), (1, None)]));
    let cycle_node = soln.cycle_node();
    let cycle = soln.cycle_meets()[0];
    let z0 = soln.zone_make(cycle_node);
    let z1 = soln.zone_make(cycle_node);
    for offset in 0..6 {
        let zone = if offset < 3 { z0 } else { z1 };
        assert!(soln.zone_add_meet_offset(zone, cycle, offset));
    }
    let node = soln.node_make();
    soln.node_add_parent(node, cycle_node);
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    soln.node_add_meet(node, a);
    soln.node_add_meet(node, b);
    assert!(soln.meet_assign(a, cycle, 0));
    assert!(soln.meet_assign(b, cycle, 1));
    assert_eq!(soln.node_irregularity(node), 0);
    assert!(soln.meet_move(b, Some((cycle, 4))));
    assert_eq!(soln.node_irregularity(node), 1);
    assert_eq!(soln.meet_offset_zone(cycle, 4), Some(z1));
}

#[test]
fn test_child_layers_per_resource() {
    let mut soln = soln_of(school(6, 2, &[(1, Some(0)), (2, Some(0)), (1, Some(1)), (1, None)]));
    let nodes = soln.make_event_nodes();
    assert_eq!(nodes.len(), 4);
    let cycle_node = soln.cycle_node();
    soln.node_child_layers_make(cycle_node);
    let layers = soln.node_child_layers(cycle_node).to_vec();
    // teacher 0, teacher 1, and the unresourced event on its own
    assert_eq!(layers.len(), 3);
    assert_eq!(soln.layer_children(layers[0]), &nodes[0..2]);
    assert_eq!(soln.layer_duration(layers[0]), 3);
    assert_eq!(soln.layer_resources(layers[1]), &[ResourceId::new(1)]);
    assert!(soln.layer_resources(layers[2]).is_empty());

    soln.node_child_layers_sort(cycle_node, |s, a, b| {
        s.layer_duration(a).cmp(&s.layer_duration(b))
    });
    assert_eq!(soln.node_child_layers(cycle_node).last(), Some(&layers[0]));
    soln.node_child_layers_delete(cycle_node);
    assert!(soln.node_parent_layers(nodes[0]).is_empty());
}

#[test]
fn test_vizier_round_trip() {
    let mut soln = soln_of(school(6, 0, &[(2, None), (1, None)]));
    let nodes = soln.make_event_nodes();
    let cycle_node = soln.cycle_node();
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign_time(a, time(2)));
    let cost = soln.cost();

    let vizier = soln.node_vizier_make(cycle_node);
    assert_eq!(soln.node_children(cycle_node), &[vizier]);
    assert_eq!(soln.node_children(vizier), &nodes[..]);
    let vm = soln.node_meets(vizier)[0];
    assert_eq!(soln.meet_asst_pair(a), Some((vm, 2)));
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    assert!(soln.meet_assign(b, vm, 5));
    assert_eq!(soln.cost(), Cost::ZERO);

    soln.node_vizier_delete(vizier);
    assert!(!soln.node_exists(vizier));
    assert_eq!(soln.node_children(cycle_node), &nodes[..]);
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    assert_eq!(soln.meet_asst_time(b), Some(time(5)));
    assert!(soln.cost() < cost);
}

#[test]
fn test_node_swap_requires_unassigned_children() {
    let mut soln = soln_of(school(6, 0, &[(1, None)]));
    let nodes = soln.make_event_nodes();
    let other = soln.node_make();
    let meet = event_meet(&soln, 0);
    assert!(soln.meet_assign_time(meet, time(0)));
    assert!(!soln.node_swap_child_nodes_and_layers(soln.cycle_node(), other));
    assert!(soln.meet_unassign(meet));
    assert!(soln.node_swap_child_nodes_and_layers(soln.cycle_node(), other));
    assert_eq!(soln.node_children(other), &nodes[..]);
    assert_eq!(soln.node_parent(nodes[0]), Some(other));
}

#[test]
fn test_delete_meet_and_node() {
    let mut soln = soln_of(school(6, 0, &[]));
    let node = soln.node_make();
    assert!(soln.node_add_parent(node, soln.cycle_node()));
    let meet = soln.meet_make(2);
    soln.node_add_meet(node, meet);
    assert_eq!(soln.node_duration(node), 2);
    soln.meet_delete(meet);
    assert!(!soln.meet_exists(meet));
    assert_eq!(soln.node_meet_count(node), 0);
    soln.node_delete(node);
    assert!(soln.node_children(soln.cycle_node()).is_empty());
}
