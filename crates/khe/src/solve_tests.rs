//! Tests for the time assignment entry points.

use super::*;
use khe_config::ThreadCount;
use khe_core::Cost;
use khe_model::{ConstraintKind, EventId, ResourceId, ResourceTypeId};
use khe_test::{nested_node_soln, school_builder, small_school, time};

fn all_event_meets_assigned(soln: &Soln) -> bool {
    soln.instance()
        .events()
        .flat_map(|e| soln.event_meets(e).to_vec())
        .all(|m| soln.meet_asst(m).is_some())
}

#[test]
fn test_assign_times_small_school() {
    let mut soln = nested_node_soln(small_school());

    assert!(assign_times(&mut soln, &SolveOptions::default()));

    assert_eq!(soln.cost(), Cost::ZERO);
    assert!(all_event_meets_assigned(&soln));
    assert!(!soln.mark_is_open());
}

#[test]
fn test_assign_times_without_runarounds_or_repair() {
    let mut soln = nested_node_soln(small_school());
    let options = SolveOptions::default()
        .with_runarounds(false)
        .with_layer_repair(false)
        .with_kempe_moves(false);

    assert!(assign_times(&mut soln, &options));
    assert!(all_event_meets_assigned(&soln));
}

#[test]
fn test_assign_times_keeps_preassigned_time() {
    let mut b = school_builder(4, 1, &[(1, Some(0))]);
    let fixed = b.add_event("Fixed", 1, Some(time(2)));
    b.add_event_resource(fixed, ResourceTypeId::new(0), Some(ResourceId::new(0)));
    let events = vec![EventId::new(0), fixed];
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events });
    let mut soln = nested_node_soln(Arc::new(b.build().unwrap()));

    assert!(assign_times(&mut soln, &SolveOptions::default()));

    let meet = |e: EventId| soln.event_meets(e)[0];
    assert_eq!(soln.meet_asst_time(meet(fixed)), Some(time(2)));
    assert_ne!(soln.meet_asst_time(meet(EventId::new(0))), Some(time(2)));
    assert_eq!(soln.cost(), Cost::ZERO);
}

#[test]
#[should_panic(expected = "mark is open")]
fn test_assign_times_rejects_open_mark() {
    let mut soln = nested_node_soln(small_school());
    let _mark = soln.mark_begin();
    assign_times(&mut soln, &SolveOptions::default());
}

#[test]
fn test_solve_keeps_best() {
    let options = SolveOptions::default()
        .with_attempts(3)
        .with_keep_best(2)
        .with_thread_count(ThreadCount::Specific(2))
        .with_diversifier(4);

    let best = solve(&small_school(), &options);

    assert_eq!(best.len(), 2);
    assert!(best[0].cost() <= best[1].cost());
    assert_eq!(best[0].cost(), Cost::ZERO);
    assert!(best.iter().all(|s| (4..7).contains(&s.diversifier())));
    assert!(best.iter().all(all_event_meets_assigned));
}

#[test]
fn test_logging_init_is_idempotent() {
    crate::logging::init();
    crate::logging::init();
    tracing::info!("logging initialized");
}
