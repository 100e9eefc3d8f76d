//! Tests for layered time assignment.

use super::*;
use khe_core::Cost;
use khe_model::ResourceId;
use khe_test::{nested_node_soln, school, small_school};

/// The resource of each child layer of `node`, in order.
fn layer_resources(soln: &Soln, node: NodeId) -> Vec<ResourceId> {
    soln.node_child_layers(node)
        .iter()
        .map(|l| soln.layer_resources(*l)[0])
        .collect()
}

fn resources(indices: &[usize]) -> Vec<ResourceId> {
    indices.iter().map(|i| ResourceId::new(*i)).collect()
}

#[test]
fn test_layered_assigns_small_school() {
    let mut soln = nested_node_soln(small_school());
    let cycle = soln.cycle_node();

    assert!(node_layered_assign_times(&mut soln, cycle, &SolveOptions::default()));

    assert_eq!(soln.cost(), Cost::ZERO);
    assert!(soln.node_child_layers(cycle).is_empty());
    assert!(!soln.mark_is_open());
}

#[test]
fn test_layered_assign_as_time_solver() {
    let mut soln = nested_node_soln(small_school());
    let cycle = soln.cycle_node();
    let options = SolveOptions::default().with_diversify(false);

    assert!(LayeredAssign.solve(&mut soln, cycle, &options));
    assert_eq!(soln.cost(), Cost::ZERO);
}

#[test]
fn test_existing_layers_are_kept_and_visited() {
    let mut soln = nested_node_soln(small_school());
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);

    assert!(node_layered_assign_times(&mut soln, cycle, &SolveOptions::default()));

    let layers = soln.node_child_layers(cycle).to_vec();
    assert_eq!(layers.len(), 4);
    assert!(layers.iter().all(|l| soln.layer_visit_num(*l) == 1));
}

#[test]
fn test_layers_sort_by_saturation() {
    let mut soln = nested_node_soln(small_school());
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);
    assert_eq!(layer_resources(&soln, cycle), resources(&[0, 1, 2, 3]));

    // Teacher0 and Class0 have two meets in four times, the others three
    sort_layers(&mut soln, cycle, false);
    assert_eq!(layer_resources(&soln, cycle), resources(&[0, 2, 1, 3]));
}

#[test]
fn test_diversifier_rotates_ties() {
    let mut soln = nested_node_soln(small_school());
    soln.set_diversifier(1);
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);

    sort_layers(&mut soln, cycle, true);
    assert_eq!(layer_resources(&soln, cycle), resources(&[2, 0, 1, 3]));
}

#[test]
fn test_visited_layers_come_first() {
    let mut soln = nested_node_soln(small_school());
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);
    let last = soln.node_child_layers(cycle)[3];
    soln.layer_set_visit_num(last, 1);

    sort_layers(&mut soln, cycle, false);
    assert_eq!(soln.node_child_layers(cycle)[0], last);
}

#[test]
fn test_layered_reports_unassigned_meet() {
    // a duration 5 event cannot fit into four times
    let mut soln = nested_node_soln(school(4, 1, &[(2, Some(0)), (5, Some(0))]));
    let cycle = soln.cycle_node();

    assert!(!node_layered_assign_times(&mut soln, cycle, &SolveOptions::default()));
}
