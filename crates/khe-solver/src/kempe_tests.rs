//! Tests for Kempe, ejecting and basic meet moves.

use std::sync::Arc;

use super::*;
use khe_core::Cost;
use khe_model::{ConstraintKind, EventId};
use khe_test::{nested_node_soln, school, school_builder, time, times};

fn event_meet(soln: &Soln, e: usize) -> MeetId {
    soln.event_meets(EventId::new(e))[0]
}

/// One teacher and `events` given as (duration, start time), all assigned.
fn assigned_school(time_count: usize, events: &[(usize, usize)]) -> Soln {
    let shape: Vec<_> = events.iter().map(|(d, _)| (*d, Some(0))).collect();
    let mut soln = nested_node_soln(school(time_count, 1, &shape));
    kempe_demand_group_monitor_make(&mut soln);
    for (i, (_, start)) in events.iter().enumerate() {
        let meet = event_meet(&soln, i);
        assert!(soln.meet_assign_time(meet, time(*start)));
    }
    assert_eq!(soln.cost(), Cost::ZERO);
    soln
}

#[test]
fn test_frame_algebra() {
    let soln = assigned_school(4, &[(2, 0), (1, 3)]);
    let cycle = soln.cycle_meets()[0];
    let a = event_meet(&soln, 0);
    let b = event_meet(&soln, 1);

    assert!(Frame::new(cycle, 0, 4).is_legal(&soln));
    assert!(!Frame::new(cycle, -1, 2).is_legal(&soln));
    assert!(!Frame::new(cycle, 2, 2).is_legal(&soln));
    assert!(!Frame::new(cycle, 3, 5).is_legal(&soln));

    assert!(Frame::new(cycle, 0, 2).overlaps(&Frame::new(cycle, 1, 3)));
    assert!(!Frame::new(cycle, 0, 2).overlaps(&Frame::new(cycle, 2, 4)));
    assert!(!Frame::new(cycle, 0, 2).overlaps(&Frame::new(a, 0, 2)));

    let enclosing = Frame::enclosing(&soln, &[a, b]);
    assert_eq!(enclosing, Frame::new(cycle, 0, 4));
    assert_eq!(enclosing.duration(), 4);
    assert!(enclosing.contains_meet(&soln, a));
    assert!(!Frame::new(cycle, 1, 4).contains_meet(&soln, a));
}

#[test]
fn test_kempe_swaps_separate_lanes() {
    let mut soln = assigned_school(4, &[(2, 0), (2, 2)]);
    let cycle = soln.cycle_meets()[0];
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));
    let mut stats = KempeStats::new();

    let mark = soln.mark_begin();
    let res = kempe_meet_move(&mut soln, a, cycle, 2, false, Some(&mut stats));
    assert_eq!(
        res,
        Ok(KempeMove {
            demand: 4,
            basic: false
        })
    );
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    assert_eq!(soln.meet_asst_time(b), Some(time(0)));
    assert_eq!(soln.cost(), Cost::ZERO);
    soln.mark_end(mark, false);

    assert_eq!(stats.step_histo_frequency(2), 1);
    assert_eq!(stats.phase_histo_frequency(2), 1);
}

#[test]
fn test_kempe_rotates_combined_frame() {
    let mut soln = assigned_school(3, &[(1, 0), (2, 1)]);
    let cycle = soln.cycle_meets()[0];
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));

    let mark = soln.mark_begin();
    let res = kempe_meet_move(&mut soln, a, cycle, 2, false, None);
    assert!(matches!(res, Ok(KempeMove { basic: false, .. })));
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    assert_eq!(soln.meet_asst_time(b), Some(time(0)));
    assert_eq!(soln.cost(), Cost::ZERO);
    soln.mark_end(mark, false);
}

#[test]
fn test_kempe_fails_when_chain_returns_to_moved_meet() {
    // x and w clash at time 0; moving x onto y sends y back to time 0,
    // which sends w to time 2, where it meets x again
    let mut soln = nested_node_soln(school(4, 1, &[(1, Some(0)); 3]));
    kempe_demand_group_monitor_make(&mut soln);
    let (x, w, y) = (event_meet(&soln, 0), event_meet(&soln, 1), event_meet(&soln, 2));
    assert!(soln.meet_assign_time(x, time(0)));
    assert!(soln.meet_assign_time(w, time(0)));
    assert!(soln.meet_assign_time(y, time(2)));
    let init_cost = soln.cost();
    assert!(init_cost > Cost::ZERO);
    let cycle = soln.cycle_meets()[0];

    let mark = soln.mark_begin();
    let res = kempe_meet_move(&mut soln, x, cycle, 2, false, None);
    assert_eq!(res, Err(KempeFailure::ReMove));
    soln.mark_end(mark, true);

    assert_eq!(soln.meet_asst_time(x), Some(time(0)));
    assert_eq!(soln.meet_asst_time(w), Some(time(0)));
    assert_eq!(soln.meet_asst_time(y), Some(time(2)));
    assert_eq!(soln.cost(), init_cost);
}

#[test]
fn test_kempe_without_clash_is_basic() {
    let mut soln = assigned_school(4, &[(1, 0), (1, 1)]);
    let a = event_meet(&soln, 0);
    let mut stats = KempeStats::new();

    let mark = soln.mark_begin();
    let res = kempe_meet_move_time(&mut soln, a, time(3), false, Some(&mut stats));
    assert_eq!(
        res,
        Ok(KempeMove {
            demand: 1,
            basic: true
        })
    );
    soln.mark_end(mark, false);
    assert_eq!(stats.step_histo_frequency(1), 1);
}

#[test]
fn test_kempe_no_change() {
    let mut soln = assigned_school(4, &[(2, 0)]);
    let cycle = soln.cycle_meets()[0];
    let a = event_meet(&soln, 0);

    let mark = soln.mark_begin();
    assert_eq!(
        kempe_meet_move(&mut soln, a, cycle, 0, false, None),
        Err(KempeFailure::NoChange)
    );
    soln.mark_end(mark, true);
}

#[test]
fn test_kempe_meet_without_preassigned_task_moves_plainly() {
    let mut soln = nested_node_soln(school(4, 0, &[(1, None)]));
    let a = event_meet(&soln, 0);
    assert!(soln.meet_assign_time(a, time(0)));

    let mark = soln.mark_begin();
    let res = kempe_meet_move_time(&mut soln, a, time(2), false, None);
    assert_eq!(
        res,
        Ok(KempeMove {
            demand: 0,
            basic: true
        })
    );
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    soln.mark_end(mark, false);
}

#[test]
fn test_kempe_fails_on_unavailable_time() {
    let mut b = school_builder(4, 1, &[(1, Some(0)), (1, Some(0))]);
    let events = vec![EventId::new(0), EventId::new(1)];
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events });
    let r = khe_model::ResourceId::new(0);
    let unavailable = b.add_constraint(
        "unavailable",
        true,
        1,
        ConstraintKind::AvoidUnavailableTimes {
            resources: vec![r],
            times: times(&[3]),
        },
    );
    let mut soln = nested_node_soln(Arc::new(b.build().unwrap()));
    soln.matching_begin_workload_requirements(r);
    soln.matching_add_workload_requirement(r, 0, times(&[3]), unavailable);
    soln.matching_end_workload_requirements(r);
    kempe_demand_group_monitor_make(&mut soln);
    let (a, other) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign_time(a, time(0)));
    assert!(soln.meet_assign_time(other, time(2)));
    let before = soln.cost();

    let mark = soln.mark_begin();
    assert_eq!(
        kempe_meet_move_time(&mut soln, a, time(3), false, None),
        Err(KempeFailure::Unavailable(r))
    );
    soln.mark_end(mark, true);
    assert_eq!(soln.meet_asst_time(a), Some(time(0)));
    assert_eq!(soln.cost(), before);

    let mark = soln.mark_begin();
    assert_eq!(
        ejecting_meet_move_time(&mut soln, a, time(3), false),
        Err(KempeFailure::Unavailable(r))
    );
    soln.mark_end(mark, true);
}

#[test]
fn test_kempe_frames_fail_across_targets() {
    let mut b = khe_model::InstanceBuilder::new("blocks");
    b.add_times("A", 3);
    b.add_break();
    b.add_times("B", 3);
    let rt = b.add_resource_type("Teacher");
    let r = b.add_resource("Teacher0", rt);
    for (name, duration) in [("X", 1), ("Y", 3)] {
        let e = b.add_event(name, duration, None);
        b.add_event_resource(e, rt, Some(r));
    }
    let mut soln = nested_node_soln(Arc::new(b.build().unwrap()));
    kempe_demand_group_monitor_make(&mut soln);
    let (x, y) = (event_meet(&soln, 0), event_meet(&soln, 1));
    assert!(soln.meet_assign_time(x, time(0)));
    assert!(soln.meet_assign_time(y, time(3)));

    let mark = soln.mark_begin();
    assert_eq!(
        kempe_meet_move_time(&mut soln, x, time(4), false, None),
        Err(KempeFailure::Frames)
    );
    soln.mark_end(mark, true);
    assert_eq!(soln.meet_asst_time(x), Some(time(0)));
}

#[test]
fn test_ejecting_unassigns_competitors() {
    let mut soln = assigned_school(4, &[(2, 0), (2, 2)]);
    let cycle = soln.cycle_meets()[0];
    let (a, b) = (event_meet(&soln, 0), event_meet(&soln, 1));

    let mark = soln.mark_begin();
    let res = ejecting_meet_move(&mut soln, a, cycle, 2, false);
    assert_eq!(
        res,
        Ok(KempeMove {
            demand: 2,
            basic: false
        })
    );
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    assert!(soln.meet_asst(b).is_none());
    assert_eq!(soln.cost(), Cost::of_hard(2));
    soln.mark_end(mark, true);
    assert_eq!(soln.meet_asst_time(b), Some(time(2)));
}

#[test]
fn test_ejecting_assigns_unassigned_meet() {
    let mut soln = assigned_school(4, &[(2, 0)]);
    let a = event_meet(&soln, 0);
    let mark = soln.mark_begin();
    assert!(soln.meet_unassign(a));

    let res = ejecting_meet_move_time(&mut soln, a, time(2), false);
    assert_eq!(
        res,
        Ok(KempeMove {
            demand: 2,
            basic: true
        })
    );
    assert_eq!(soln.meet_asst_time(a), Some(time(2)));
    soln.mark_end(mark, false);
}

#[test]
fn test_basic_move_respects_regularity() {
    let mut soln = nested_node_soln(school(4, 0, &[(2, None)]));
    let cycle_node = soln.cycle_node();
    let cycle = soln.cycle_meets()[0];
    let z0 = soln.zone_make(cycle_node);
    let z1 = soln.zone_make(cycle_node);
    for offset in 0..4 {
        let zone = if offset < 2 { z0 } else { z1 };
        assert!(soln.zone_add_meet_offset(zone, cycle, offset));
    }
    let a = event_meet(&soln, 0);
    assert!(soln.meet_assign_time(a, time(0)));

    assert_eq!(
        basic_meet_move(&mut soln, a, cycle, 0, true),
        Err(KempeFailure::NoChange)
    );
    assert_eq!(
        basic_meet_move(&mut soln, a, cycle, 1, true),
        Err(KempeFailure::Regularity)
    );
    assert!(basic_meet_move_time(&mut soln, a, time(2), true).is_ok());
    assert!(basic_meet_move_time(&mut soln, a, time(1), false).is_ok());
}

#[test]
fn test_kempe_demand_group_monitor_covers_preassigned_tasks() {
    let mut soln = nested_node_soln(school(4, 1, &[(2, Some(0)), (3, None)]));
    let group = kempe_demand_group_monitor_make(&mut soln);

    assert_eq!(soln.group_monitor_members(group).len(), 2);
    assert_eq!(soln.group_monitor_tag(group), MonitorTag::KempeDemand);
}
