//! Tests for the workload requirement compiler.

use std::sync::Arc;

use super::*;
use khe_model::{InstanceBuilder, TimeId};
use khe_test::{school_builder, soln_of, times};

fn teacher(i: usize) -> ResourceId {
    ResourceId::new(i)
}

#[test]
fn test_avoid_unavailable_claims_each_time() {
    let mut b = school_builder(5, 2, &[]);
    b.add_constraint(
        "unavailable",
        true,
        1,
        ConstraintKind::AvoidUnavailableTimes {
            resources: vec![teacher(0)],
            times: times(&[1, 3]),
        },
    );
    let mut soln = soln_of(Arc::new(b.build().unwrap()));

    workload_requirements(&mut soln);

    assert_eq!(soln.resource_workload_demand_nodes(teacher(0)).len(), 2);
    assert!(soln.resource_workload_demand_nodes(teacher(1)).is_empty());
}

#[test]
fn test_soft_constraints_are_ignored() {
    let mut b = school_builder(5, 1, &[]);
    b.add_constraint(
        "unavailable",
        false,
        10,
        ConstraintKind::AvoidUnavailableTimes {
            resources: vec![teacher(0)],
            times: times(&[1, 3]),
        },
    );
    let mut soln = soln_of(Arc::new(b.build().unwrap()));

    workload_requirements(&mut soln);

    assert!(soln.resource_workload_demand_nodes(teacher(0)).is_empty());
}

#[test]
fn test_limit_busy_times() {
    let mut b = school_builder(6, 3, &[]);
    for (r, maximum) in [(0, 0), (1, 1), (2, 3)] {
        b.add_constraint(
            "busy",
            true,
            1,
            ConstraintKind::LimitBusyTimes {
                resources: vec![teacher(r)],
                time_groups: vec![times(&[0, 1, 2])],
                maximum,
            },
        );
    }
    let mut soln = soln_of(Arc::new(b.build().unwrap()));

    workload_requirements(&mut soln);

    // limit 0 avoids every time, limit 1 of 3 claims two, limit 3 of 3 none
    assert_eq!(soln.resource_workload_demand_nodes(teacher(0)).len(), 3);
    assert_eq!(soln.resource_workload_demand_nodes(teacher(1)).len(), 2);
    assert!(soln.resource_workload_demand_nodes(teacher(2)).is_empty());
}

fn workload_instance(special: bool) -> Arc<Instance> {
    let mut b = InstanceBuilder::new("workload");
    b.add_times("T", 4);
    let rt = b.add_resource_type("Teacher");
    let r = b.add_resource("Teacher0", rt);
    let e = b.add_event("Sport", 2, None);
    if special {
        b.add_event_resource_with_workload(e, rt, Some(r), 1);
    } else {
        b.add_event_resource(e, rt, Some(r));
    }
    b.add_constraint(
        "workload",
        true,
        1,
        ConstraintKind::LimitWorkload {
            resources: vec![r],
            maximum: 2,
        },
    );
    Arc::new(b.build().unwrap())
}

#[test]
fn test_limit_workload_without_special_workloads() {
    let mut soln = soln_of(workload_instance(false));

    workload_requirements(&mut soln);

    // busy at most 2 of 4 times
    assert_eq!(soln.resource_workload_demand_nodes(teacher(0)).len(), 2);
}

#[test]
fn test_limit_workload_adjusted_by_cluster() {
    let instance = workload_instance(true);
    let clusters = event_clusters(&instance);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].resource_adjustment(&instance, teacher(0)), 1);

    let mut soln = soln_of(instance);
    workload_requirements(&mut soln);

    // workload 2 becomes 3 busy times of 4
    assert_eq!(soln.resource_workload_demand_nodes(teacher(0)).len(), 1);
}

#[test]
fn test_event_clusters_merge_by_time_and_links() {
    let mut b = InstanceBuilder::new("clusters");
    b.add_times("T", 4);
    let rt = b.add_resource_type("Teacher");
    let r0 = b.add_resource("Teacher0", rt);
    let r1 = b.add_resource("Teacher1", rt);
    let a = b.add_event("A", 1, Some(TimeId::new(0)));
    let c = b.add_event("C", 1, Some(TimeId::new(0)));
    let d = b.add_event("D", 1, None);
    let x = b.add_event("X", 1, None);
    let y = b.add_event("Y", 1, None);
    b.add_event_resource_with_workload(a, rt, Some(r0), 0);
    b.add_event_resource(c, rt, Some(r1));
    b.add_event_resource(d, rt, None);
    b.add_event_resource(x, rt, Some(r0));
    b.add_event_resource(y, rt, Some(r1));
    b.add_constraint(
        "link",
        true,
        1,
        ConstraintKind::LinkEvents {
            event_groups: vec![vec![c, d], vec![x, y]],
        },
    );
    let instance = b.build().unwrap();

    let clusters = event_clusters(&instance);

    // {A, C, D} has a special workload; {X, Y} has none and is dropped
    assert_eq!(clusters.len(), 1);
    let mut events = clusters[0].events.clone();
    events.sort();
    assert_eq!(events, vec![a, c, d]);

    // r0 must take A; r1 must take C and may take D
    assert_eq!(clusters[0].resource_adjustment(&instance, r0), 1);
    assert_eq!(clusters[0].resource_adjustment(&instance, r1), 0);
}

#[test]
fn test_requirements_sorted_by_decreasing_weight() {
    let instance = {
        let mut b = school_builder(3, 1, &[]);
        b.add_constraint(
            "light",
            true,
            1,
            ConstraintKind::AvoidUnavailableTimes {
                resources: vec![teacher(0)],
                times: times(&[0]),
            },
        );
        b.add_constraint(
            "heavy",
            true,
            5,
            ConstraintKind::AvoidUnavailableTimes {
                resources: vec![teacher(0)],
                times: times(&[1]),
            },
        );
        b.build().unwrap()
    };
    let light = ConstraintId::new(0);
    let heavy = ConstraintId::new(1);

    assert_eq!(requirement_cmp(&instance, heavy, light), Ordering::Less);
    assert_eq!(requirement_cmp(&instance, light, light), Ordering::Equal);
}
