//! Tests for time equivalence.

use std::sync::Arc;

use super::*;
use khe_test::{school, school_builder, soln_of};

/// Fixes the meet of each `(event, offset)` into one fresh meet of
/// duration 2.
fn fix_into_shared_meet(soln: &mut Soln, placements: &[(usize, usize)]) {
    let shared = soln.meet_make(2);
    for (e, offset) in placements {
        let meet = soln.event_meets(EventId::new(*e))[0];
        assert!(soln.meet_assign(meet, shared, *offset));
        soln.meet_assign_fix(meet);
    }
}

#[test]
fn test_unfixed_events_stand_alone() {
    let soln = soln_of(school(4, 1, &[(1, Some(0)), (1, Some(0)), (2, Some(0))]));
    let te = TimeEquiv::solve(&soln);

    assert_eq!(te.event_group_count(), 3);
    for i in 0..3 {
        let e = EventId::new(i);
        assert_eq!(te.event_group_of(e), &[e]);
        assert_eq!(te.event_group_index(e), i);
    }
}

#[test]
fn test_events_fixed_together_are_equivalent() {
    let mut soln = soln_of(school(4, 2, &[(1, Some(0)), (1, Some(1)), (1, Some(0))]));
    fix_into_shared_meet(&mut soln, &[(0, 0), (1, 0)]);

    let te = TimeEquiv::solve(&soln);

    assert_eq!(te.event_group_count(), 2);
    assert_eq!(te.event_group(0), &[EventId::new(0), EventId::new(1)]);
    assert_eq!(te.event_group(1), &[EventId::new(2)]);
    assert_eq!(
        te.event_group_index(EventId::new(1)),
        te.event_group_index(EventId::new(0))
    );

    // Teacher0 attends {E0, E1} and {E2}, Teacher1 only {E0, E1}
    assert_eq!(te.resource_group_count(), 2);
}

#[test]
fn test_different_offsets_break_groups_up() {
    let mut soln = soln_of(school(4, 2, &[(1, Some(0)), (1, Some(1))]));
    fix_into_shared_meet(&mut soln, &[(0, 0), (1, 1)]);

    let te = TimeEquiv::solve(&soln);

    assert_eq!(te.event_group_count(), 2);
    assert_ne!(
        te.event_group_index(EventId::new(0)),
        te.event_group_index(EventId::new(1))
    );
}

#[test]
fn test_resources_attending_equivalent_events_are_grouped() {
    let mut soln = soln_of(school(4, 2, &[(1, Some(0)), (1, Some(1))]));
    fix_into_shared_meet(&mut soln, &[(0, 0), (1, 0)]);

    let te = TimeEquiv::solve(&soln);

    let (r0, r1) = (ResourceId::new(0), ResourceId::new(1));
    assert_eq!(te.resource_group_count(), 1);
    assert_eq!(te.resource_group_of(r1), &[r0, r1]);
    assert_eq!(te.resource_group_index(r0), te.resource_group_index(r1));
}

#[test]
fn test_partly_unassigned_resource_type_is_not_grouped() {
    let mut b = school_builder(4, 2, &[(1, Some(0)), (1, Some(1))]);
    let open = b.add_event("Open", 1, None);
    b.add_event_resource(open, ResourceTypeId::new(0), None);
    let mut soln = soln_of(Arc::new(b.build().unwrap()));
    fix_into_shared_meet(&mut soln, &[(0, 0), (1, 0)]);

    let te = TimeEquiv::solve(&soln);

    assert_eq!(te.event_group_count(), 2);
    assert_eq!(te.resource_group_count(), 2);
}
