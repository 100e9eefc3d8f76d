//! Tests for layer and node repair.

use super::*;
use khe_core::Cost;
use khe_model::EventId;
use khe_test::{nested_node_soln, school, time};

fn event_meet(soln: &Soln, e: usize) -> MeetId {
    soln.event_meets(EventId::new(e))[0]
}

/// One teacher, four times, two events of duration 1 both at time 0.
fn clashing() -> Soln {
    let mut soln = nested_node_soln(school(4, 1, &[(1, Some(0)), (1, Some(0))]));
    for e in 0..2 {
        let meet = event_meet(&soln, e);
        assert!(soln.meet_assign_time(meet, time(0)));
    }
    assert!(soln.cost() > Cost::ZERO);
    soln
}

#[test]
fn test_node_repair_separates_clash() {
    let mut soln = clashing();
    let cycle = soln.cycle_node();

    assert!(node_repair_times(&mut soln, cycle, &SolveOptions::default()));

    assert_eq!(soln.cost(), Cost::ZERO);
    assert_ne!(
        soln.meet_asst_time(event_meet(&soln, 0)),
        soln.meet_asst_time(event_meet(&soln, 1))
    );
    assert!(!soln.mark_is_open());
}

#[test]
fn test_repair_reports_no_improvement() {
    let mut soln = nested_node_soln(school(4, 1, &[(1, Some(0)), (1, Some(0))]));
    for (e, t) in [(0, 0), (1, 2)] {
        let meet = event_meet(&soln, e);
        assert!(soln.meet_assign_time(meet, time(t)));
    }
    let cycle = soln.cycle_node();

    assert!(!node_repair_times(&mut soln, cycle, &SolveOptions::default()));

    assert_eq!(soln.meet_asst_time(event_meet(&soln, 0)), Some(time(0)));
    assert_eq!(soln.meet_asst_time(event_meet(&soln, 1)), Some(time(2)));
}

#[test]
fn test_basic_repair_assigns_unassigned_meet() {
    let mut soln = nested_node_soln(school(4, 1, &[(2, Some(0)), (1, Some(0))]));
    let first = event_meet(&soln, 0);
    assert!(soln.meet_assign_time(first, time(0)));
    let cycle = soln.cycle_node();
    let options = SolveOptions::default().with_kempe_moves(false);

    assert!(node_repair_times(&mut soln, cycle, &options));

    assert_eq!(soln.cost(), Cost::ZERO);
    let second = soln.meet_asst_time(event_meet(&soln, 1));
    assert!(matches!(second, Some(t) if t.index() >= 2));
}

#[test]
fn test_vizier_repair_restores_structure() {
    let mut soln = clashing();
    let cycle = soln.cycle_node();
    let (nodes, meets) = (soln.node_count(), soln.meet_count());
    let options = SolveOptions::default().with_vizier_node(true);

    assert!(node_repair_times(&mut soln, cycle, &options));

    assert_eq!(soln.cost(), Cost::ZERO);
    assert_eq!(soln.node_count(), nodes);
    assert_eq!(soln.meet_count(), meets);
    assert_eq!(soln.node_child_count(cycle), 2);
    let target = soln.meet_asst(event_meet(&soln, 0));
    assert_eq!(target, Some(soln.cycle_meets()[0]));
}

#[test]
fn test_layer_repair_separates_clash() {
    let mut soln = clashing();
    let cycle = soln.cycle_node();
    soln.node_child_layers_make(cycle);
    let layer = soln.node_child_layers(cycle)[0];

    assert!(layer_repair_times(&mut soln, layer, &SolveOptions::default()));
    assert_eq!(soln.cost(), Cost::ZERO);
}

#[test]
fn test_zero_passes_change_nothing() {
    let mut soln = clashing();
    let cycle = soln.cycle_node();
    let cost = soln.cost();
    let options = SolveOptions::default().with_repair_max_passes(0);

    assert!(!node_repair_times(&mut soln, cycle, &options));
    assert_eq!(soln.cost(), cost);
}
