//! Test fixtures for khe-model
//!
//! Small instances built with [`InstanceBuilder`], shared by the crate's
//! test modules.

use std::sync::Arc;

use khe_core::LSet;

use crate::ids::{EventId, ResourceId, TimeId};
use crate::instance::{ConstraintKind, Instance, InstanceBuilder};
use crate::soln::Soln;

/// One block of `time_count` times, `teacher_count` teachers, and one event
/// per `(duration, teacher)` entry, where `teacher` indexes the teachers.
/// Every event is covered by a required assign-time constraint of weight 1.
pub fn school(
    time_count: usize,
    teacher_count: usize,
    events: &[(usize, Option<usize>)],
) -> Arc<Instance> {
    let mut b = school_builder(time_count, teacher_count, events);
    let all: Vec<EventId> = (0..events.len()).map(EventId::new).collect();
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events: all });
    Arc::new(b.build().unwrap())
}

/// The builder behind [`school`], without constraints.
pub fn school_builder(
    time_count: usize,
    teacher_count: usize,
    events: &[(usize, Option<usize>)],
) -> InstanceBuilder {
    let mut b = InstanceBuilder::new("school");
    b.add_times("T", time_count);
    let rt = b.add_resource_type("Teacher");
    let teachers: Vec<ResourceId> = (0..teacher_count)
        .map(|i| b.add_resource(format!("Teacher{}", i), rt))
        .collect();
    for (i, (duration, teacher)) in events.iter().enumerate() {
        let e = b.add_event(format!("E{}", i), *duration, None);
        if let Some(t) = teacher {
            b.add_event_resource(e, rt, Some(teachers[*t]));
        }
    }
    b
}

/// A solution of `instance` with event meets made.
pub fn soln_of(instance: Arc<Instance>) -> Soln {
    let mut soln = Soln::new(instance, 0);
    soln.make_event_meets();
    soln
}

pub fn times(ts: &[usize]) -> LSet {
    ts.iter().copied().collect()
}

pub fn time(i: usize) -> TimeId {
    TimeId::new(i)
}
