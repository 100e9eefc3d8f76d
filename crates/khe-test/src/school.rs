//! School-shaped instances.

use std::sync::Arc;

use khe_core::LSet;
use khe_model::{ConstraintKind, EventId, Instance, InstanceBuilder, ResourceId, Soln, TimeId};

/// One block of `time_count` times, `teacher_count` teachers, and one event
/// per `(duration, teacher)` entry, where `teacher` indexes the teachers.
/// Every event is covered by a required assign-time constraint of weight 1.
///
/// # Example
///
/// ```
/// use khe_test::school;
///
/// let instance = school(4, 1, &[(2, Some(0)), (2, Some(0))]);
/// assert_eq!(instance.time_count(), 4);
/// assert_eq!(instance.event_count(), 2);
/// ```
pub fn school(
    time_count: usize,
    teacher_count: usize,
    events: &[(usize, Option<usize>)],
) -> Arc<Instance> {
    let mut b = school_builder(time_count, teacher_count, events);
    let all: Vec<EventId> = (0..events.len()).map(EventId::new).collect();
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events: all });
    Arc::new(b.build().expect("school fixture is valid"))
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

/// Two days of four times, two teachers and two classes.
///
/// Events, all unassigned and covered by a required assign-time constraint:
///
/// | event | duration | teacher | class |
/// |-------|----------|---------|-------|
/// | Maths | 2        | 0       | 0     |
/// | English | 2      | 1       | 0     |
/// | Science | 2      | 0       | 1     |
/// | History | 1      | 1       | 1     |
/// | Art   | 1        | 1       | 1     |
///
/// Class 0 carries partition `"2 2"`.
pub fn small_school() -> Arc<Instance> {
    let mut b = InstanceBuilder::new("small_school");
    b.add_times("Mon", 4);
    b.add_break();
    b.add_times("Tue", 4);
    let teacher = b.add_resource_type("Teacher");
    let class = b.add_resource_type("Class");
    let t0 = b.add_resource("Teacher0", teacher);
    let t1 = b.add_resource("Teacher1", teacher);
    let c0 = b.add_resource_with_partition("Class0", class, "2 2");
    let c1 = b.add_resource("Class1", class);
    let shape = [
        ("Maths", 2, t0, c0),
        ("English", 2, t1, c0),
        ("Science", 2, t0, c1),
        ("History", 1, t1, c1),
        ("Art", 1, t1, c1),
    ];
    let mut events = Vec::new();
    for (name, duration, t, c) in shape {
        let e = b.add_event(name, duration, None);
        b.add_event_resource(e, teacher, Some(t));
        b.add_event_resource(e, class, Some(c));
        events.push(e);
    }
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events });
    Arc::new(b.build().expect("small_school fixture is valid"))
}

/// Two blocks of three times each, one teacher, and three events of
/// durations 3, 2 and 1 taught by that teacher.
pub fn two_block_cycle() -> Arc<Instance> {
    let mut b = InstanceBuilder::new("two_block_cycle");
    b.add_times("A", 3);
    b.add_break();
    b.add_times("B", 3);
    let rt = b.add_resource_type("Teacher");
    let r = b.add_resource("Teacher0", rt);
    let mut events = Vec::new();
    for (i, duration) in [3, 2, 1].into_iter().enumerate() {
        let e = b.add_event(format!("E{}", i), duration, None);
        b.add_event_resource(e, rt, Some(r));
        events.push(e);
    }
    b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events });
    Arc::new(b.build().expect("two_block_cycle fixture is valid"))
}

/// A solution of `instance` with event meets made.
pub fn soln_of(instance: Arc<Instance>) -> Soln {
    let mut soln = Soln::new(instance, 0);
    soln.make_event_meets();
    soln
}

/// A solution of `instance` with event meets made and each event's meets in
/// a node of its own below the cycle node.
pub fn nested_node_soln(instance: Arc<Instance>) -> Soln {
    let mut soln = soln_of(instance);
    soln.make_event_nodes();
    soln
}

pub fn times(ts: &[usize]) -> LSet {
    ts.iter().copied().collect()
}

pub fn time(i: usize) -> TimeId {
    TimeId::new(i)
}
