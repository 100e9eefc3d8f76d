//! Tests for parallel layer assignment.

use super::*;
use khe_model::EventId;
use khe_test::{nested_node_soln, school, time};

fn event_meet(soln: &Soln, e: usize) -> MeetId {
    soln.event_meets(EventId::new(e))[0]
}

/// Two teachers with one event each, E0 assigned at time 3, and the
/// child layers of the cycle node made: one per teacher.
fn two_layers(durations: [usize; 2]) -> (Soln, LayerId) {
    let shape = [(durations[0], Some(0)), (durations[1], Some(1))];
    let mut soln = nested_node_soln(school(8, 2, &shape));
    assert!(soln.meet_assign_time(event_meet(&soln, 0), time(3)));
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);
    assert_eq!(soln.node_child_layers(cycle).len(), 2);
    let layer = soln.node_child_layers(cycle)[1];
    (soln, layer)
}

#[test]
fn test_layer_runs_parallel_to_sibling() {
    let (mut soln, layer) = two_layers([1, 1]);

    assert!(layer_parallel_assign_times(&mut soln, layer, &SolveOptions::default()));

    assert_eq!(soln.meet_asst_time(event_meet(&soln, 1)), Some(time(3)));
}

#[test]
fn test_nodes_of_different_duration_do_not_match() {
    let (mut soln, layer) = two_layers([2, 1]);

    assert!(!layer_parallel_assign_times(&mut soln, layer, &SolveOptions::default()));

    assert_eq!(soln.meet_asst(event_meet(&soln, 1)), None);
}

#[test]
fn test_already_parallel_node_is_kept() {
    let (mut soln, layer) = two_layers([1, 1]);
    assert!(soln.meet_assign_time(event_meet(&soln, 1), time(3)));

    assert!(layer_parallel_assign_times(&mut soln, layer, &SolveOptions::default()));

    assert_eq!(soln.meet_asst_time(event_meet(&soln, 1)), Some(time(3)));
}

#[test]
fn test_overlap_elsewhere_blocks_match() {
    let (mut soln, layer) = two_layers([1, 1]);
    assert!(soln.meet_assign_time(event_meet(&soln, 1), time(5)));

    // E1 is assigned but nowhere near E0, and has no unassigned meet left
    assert!(!layer_parallel_assign_times(&mut soln, layer, &SolveOptions::default()));

    assert_eq!(soln.meet_asst_time(event_meet(&soln, 1)), Some(time(5)));
}

#[test]
fn test_unassigned_siblings_are_ignored() {
    let shape = [(1, Some(0)), (1, Some(1))];
    let mut soln = nested_node_soln(school(8, 2, &shape));
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);
    let layer = soln.node_child_layers(cycle)[1];

    assert!(layer_parallel_assign_times(&mut soln, layer, &SolveOptions::default()));
    assert_eq!(soln.meet_asst(event_meet(&soln, 1)), None);
}
