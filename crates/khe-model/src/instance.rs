//! The instance: times, resources, events and constraints.
//!
//! An [`Instance`] is immutable once built. Solutions share it through an
//! `Arc`, so any number of solutions (one per parallel attempt) can refer
//! to the same instance.

use std::sync::Arc;

use khe_core::{Cost, LSet};

use crate::error::ModelError;
use crate::ids::{ConstraintId, EventId, ResourceId, ResourceTypeId, TimeId};

/// One time of the cycle.
#[derive(Debug, Clone)]
pub struct Time {
    pub name: Arc<str>,
    /// True when a break (end of day, say) follows this time.
    pub break_after: bool,
}

/// A maximal run of times without internal breaks. Each block becomes one
/// cycle meet of the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: TimeId,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct ResourceType {
    pub name: Arc<str>,
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub name: Arc<str>,
    pub resource_type: ResourceTypeId,
    /// Resources with equal labels are interchangeable for structural
    /// purposes (for example, all students of one year group).
    pub partition: Option<Arc<str>>,
}

/// One resource requirement of an event.
#[derive(Debug, Clone)]
pub struct EventResource {
    pub resource_type: ResourceTypeId,
    pub preassigned: Option<ResourceId>,
    /// The resources that may be assigned.
    pub domain: LSet,
    /// Workload the event places on its resource; usually the duration.
    pub workload: usize,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub name: Arc<str>,
    pub duration: usize,
    pub preassigned_time: Option<TimeId>,
    pub resources: Vec<EventResource>,
}

impl Event {
    /// True when some event resource's workload differs from the duration.
    pub fn has_special_workload(&self) -> bool {
        self.resources.iter().any(|er| er.workload != self.duration)
    }
}

/// The kinds of constraint this engine evaluates or compiles.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// Each listed event's meets should have times.
    AssignTime { events: Vec<EventId> },
    /// Each listed event's meets should start at one of `times`.
    PreferTimes { events: Vec<EventId>, times: LSet },
    /// Each listed resource should be free at `times`.
    AvoidUnavailableTimes {
        resources: Vec<ResourceId>,
        times: LSet,
    },
    /// Each listed resource should be busy at most `maximum` times of each
    /// time group.
    LimitBusyTimes {
        resources: Vec<ResourceId>,
        time_groups: Vec<LSet>,
        maximum: usize,
    },
    /// Each listed resource's total workload should be at most `maximum`.
    LimitWorkload {
        resources: Vec<ResourceId>,
        maximum: usize,
    },
    /// The events of each group should run simultaneously.
    LinkEvents { event_groups: Vec<Vec<EventId>> },
}

#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: Arc<str>,
    pub required: bool,
    pub weight: i64,
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Hard weight when required, soft otherwise.
    pub fn combined_weight(&self) -> Cost {
        Cost::combined_weight(self.required, self.weight)
    }

    /// The resources a resource constraint applies to; empty for event
    /// constraints.
    pub fn resources(&self) -> &[ResourceId] {
        match &self.kind {
            ConstraintKind::AvoidUnavailableTimes { resources, .. }
            | ConstraintKind::LimitBusyTimes { resources, .. }
            | ConstraintKind::LimitWorkload { resources, .. } => resources,
            _ => &[],
        }
    }

    /// The events an event constraint applies to; empty otherwise.
    pub fn events(&self) -> &[EventId] {
        match &self.kind {
            ConstraintKind::AssignTime { events } | ConstraintKind::PreferTimes { events, .. } => {
                events
            }
            _ => &[],
        }
    }
}

/// An immutable timetabling instance.
#[derive(Debug, Clone)]
pub struct Instance {
    name: Arc<str>,
    times: Vec<Time>,
    blocks: Vec<Block>,
    time_blocks: Vec<(usize, usize)>,
    resource_types: Vec<ResourceType>,
    resources: Vec<Resource>,
    events: Vec<Event>,
    constraints: Vec<Constraint>,
    event_time_constraints: Vec<Vec<ConstraintId>>,
    resource_constraints: Vec<Vec<ConstraintId>>,
    resource_layer_events: Vec<Vec<EventId>>,
    resource_layer_durations: Vec<usize>,
}

impl Instance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_count(&self) -> usize {
        self.times.len()
    }

    pub fn time(&self, t: TimeId) -> &Time {
        &self.times[t.index()]
    }

    pub fn times(&self) -> impl Iterator<Item = TimeId> + '_ {
        (0..self.times.len()).map(TimeId::new)
    }

    /// The set of every time index.
    pub fn all_times(&self) -> LSet {
        LSet::full(self.times.len())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block containing `t`, and `t`'s offset within it.
    pub fn time_block(&self, t: TimeId) -> (usize, usize) {
        self.time_blocks[t.index()]
    }

    pub fn resource_type_count(&self) -> usize {
        self.resource_types.len()
    }

    pub fn resource_type(&self, rt: ResourceTypeId) -> &ResourceType {
        &self.resource_types[rt.index()]
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn resource(&self, r: ResourceId) -> &Resource {
        &self.resources[r.index()]
    }

    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources.len()).map(ResourceId::new)
    }

    pub fn resources_of_type(&self, rt: ResourceTypeId) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources()
            .filter(move |r| self.resources[r.index()].resource_type == rt)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn event(&self, e: EventId) -> &Event {
        &self.events[e.index()]
    }

    pub fn events(&self) -> impl Iterator<Item = EventId> + '_ {
        (0..self.events.len()).map(EventId::new)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint(&self, c: ConstraintId) -> &Constraint {
        &self.constraints[c.index()]
    }

    pub fn constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        (0..self.constraints.len()).map(ConstraintId::new)
    }

    /// Assign-time and prefer-times constraints that apply to `e`.
    pub fn event_time_constraints(&self, e: EventId) -> &[ConstraintId] {
        &self.event_time_constraints[e.index()]
    }

    /// Resource constraints that apply to `r`.
    pub fn resource_constraints(&self, r: ResourceId) -> &[ConstraintId] {
        &self.resource_constraints[r.index()]
    }

    /// Events with an event resource preassigned `r`.
    pub fn resource_layer_events(&self, r: ResourceId) -> &[EventId] {
        &self.resource_layer_events[r.index()]
    }

    /// Total duration of [`resource_layer_events`](Self::resource_layer_events).
    pub fn resource_layer_duration(&self, r: ResourceId) -> usize {
        self.resource_layer_durations[r.index()]
    }
}

/// Incremental construction of an [`Instance`].
///
/// # Examples
///
/// ```
/// use khe_model::{ConstraintKind, InstanceBuilder};
///
/// let mut b = InstanceBuilder::new("tiny");
/// let t0 = b.add_time("Mon1");
/// b.add_time("Mon2");
/// b.add_break();
/// b.add_time("Tue1");
/// let teachers = b.add_resource_type("Teacher");
/// let smith = b.add_resource("Smith", teachers);
/// let maths = b.add_event("Maths", 2, None);
/// b.add_event_resource(maths, teachers, Some(smith));
/// b.add_constraint("assign", true, 1, ConstraintKind::AssignTime { events: vec![maths] });
///
/// let instance = b.build().unwrap();
/// assert_eq!(instance.time_count(), 3);
/// assert_eq!(instance.blocks().len(), 2);
/// assert_eq!(instance.resource_layer_duration(smith), 2);
/// assert_eq!(instance.time_block(t0), (0, 0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstanceBuilder {
    name: String,
    times: Vec<Time>,
    resource_types: Vec<ResourceType>,
    resources: Vec<Resource>,
    events: Vec<Event>,
    event_resources: Vec<(EventId, ResourceTypeId, Option<ResourceId>, Option<usize>)>,
    constraints: Vec<Constraint>,
}

impl InstanceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_time(&mut self, name: impl Into<Arc<str>>) -> TimeId {
        self.times.push(Time {
            name: name.into(),
            break_after: false,
        });
        TimeId::new(self.times.len() - 1)
    }

    /// Adds `count` times named `prefix0`, `prefix1`, and so on.
    pub fn add_times(&mut self, prefix: &str, count: usize) -> Vec<TimeId> {
        (0..count)
            .map(|i| self.add_time(format!("{}{}", prefix, i)))
            .collect()
    }

    /// Marks a break after the most recently added time.
    pub fn add_break(&mut self) {
        if let Some(last) = self.times.last_mut() {
            last.break_after = true;
        }
    }

    pub fn add_resource_type(&mut self, name: impl Into<Arc<str>>) -> ResourceTypeId {
        self.resource_types.push(ResourceType { name: name.into() });
        ResourceTypeId::new(self.resource_types.len() - 1)
    }

    pub fn add_resource(&mut self, name: impl Into<Arc<str>>, rt: ResourceTypeId) -> ResourceId {
        self.resources.push(Resource {
            name: name.into(),
            resource_type: rt,
            partition: None,
        });
        ResourceId::new(self.resources.len() - 1)
    }

    pub fn add_resource_with_partition(
        &mut self,
        name: impl Into<Arc<str>>,
        rt: ResourceTypeId,
        partition: impl Into<Arc<str>>,
    ) -> ResourceId {
        let r = self.add_resource(name, rt);
        self.resources[r.index()].partition = Some(partition.into());
        r
    }

    pub fn add_event(
        &mut self,
        name: impl Into<Arc<str>>,
        duration: usize,
        preassigned_time: Option<TimeId>,
    ) -> EventId {
        self.events.push(Event {
            name: name.into(),
            duration,
            preassigned_time,
            resources: Vec::new(),
        });
        EventId::new(self.events.len() - 1)
    }

    /// Adds a resource requirement to `event`, with workload equal to the
    /// event's duration.
    pub fn add_event_resource(
        &mut self,
        event: EventId,
        rt: ResourceTypeId,
        preassigned: Option<ResourceId>,
    ) {
        self.event_resources.push((event, rt, preassigned, None));
    }

    pub fn add_event_resource_with_workload(
        &mut self,
        event: EventId,
        rt: ResourceTypeId,
        preassigned: Option<ResourceId>,
        workload: usize,
    ) {
        self.event_resources
            .push((event, rt, preassigned, Some(workload)));
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<Arc<str>>,
        required: bool,
        weight: i64,
        kind: ConstraintKind,
    ) -> ConstraintId {
        self.constraints.push(Constraint {
            name: name.into(),
            required,
            weight,
            kind,
        });
        ConstraintId::new(self.constraints.len() - 1)
    }

    /// Validates every reference and builds the instance.
    pub fn build(self) -> Result<Instance, ModelError> {
        let InstanceBuilder {
            name,
            times,
            resource_types,
            resources,
            mut events,
            event_resources,
            constraints,
        } = self;
        if times.is_empty() {
            return Err(ModelError::NoTimes);
        }
        let time_count = times.len();

        // blocks
        let mut blocks = Vec::new();
        let mut time_blocks = Vec::with_capacity(time_count);
        let mut start = 0;
        for (i, time) in times.iter().enumerate() {
            time_blocks.push((blocks.len(), i - start));
            if time.break_after || i + 1 == time_count {
                blocks.push(Block {
                    start: TimeId::new(start),
                    len: i + 1 - start,
                });
                start = i + 1;
            }
        }

        for r in &resources {
            if r.resource_type.index() >= resource_types.len() {
                return Err(ModelError::UnknownResourceType(r.resource_type.index()));
            }
        }

        for event in &events {
            if event.duration == 0 {
                return Err(ModelError::ZeroDuration(event.name.to_string()));
            }
            if let Some(t) = event.preassigned_time {
                if t.index() >= time_count {
                    return Err(ModelError::UnknownTime(t.index()));
                }
                let (b, offset) = time_blocks[t.index()];
                if offset + event.duration > blocks[b].len {
                    return Err(ModelError::PreassignedTimeOverflow {
                        event: event.name.to_string(),
                        time: times[t.index()].name.to_string(),
                        duration: event.duration,
                    });
                }
            }
        }

        for (e, rt, preassigned, workload) in event_resources {
            let event = events
                .get_mut(e.index())
                .ok_or(ModelError::UnknownEvent(e.index()))?;
            if rt.index() >= resource_types.len() {
                return Err(ModelError::UnknownResourceType(rt.index()));
            }
            let domain: LSet = match preassigned {
                Some(r) => {
                    let res = resources
                        .get(r.index())
                        .ok_or(ModelError::UnknownResource(r.index()))?;
                    if res.resource_type != rt {
                        return Err(ModelError::ResourceTypeMismatch {
                            event: event.name.to_string(),
                            resource: res.name.to_string(),
                        });
                    }
                    LSet::singleton(r.index())
                }
                None => resources
                    .iter()
                    .enumerate()
                    .filter(|(_, res)| res.resource_type == rt)
                    .map(|(i, _)| i)
                    .collect(),
            };
            let workload = workload.unwrap_or(event.duration);
            event.resources.push(EventResource {
                resource_type: rt,
                preassigned,
                domain,
                workload,
            });
        }

        let check_events = |es: &[EventId]| -> Result<(), ModelError> {
            match es.iter().find(|e| e.index() >= events.len()) {
                Some(e) => Err(ModelError::UnknownEvent(e.index())),
                None => Ok(()),
            }
        };
        let check_resources = |rs: &[ResourceId]| -> Result<(), ModelError> {
            match rs.iter().find(|r| r.index() >= resources.len()) {
                Some(r) => Err(ModelError::UnknownResource(r.index())),
                None => Ok(()),
            }
        };
        let check_times = |ts: &LSet| -> Result<(), ModelError> {
            match ts.last() {
                Some(t) if t >= time_count => Err(ModelError::UnknownTime(t)),
                _ => Ok(()),
            }
        };

        let mut event_time_constraints = vec![Vec::new(); events.len()];
        let mut resource_constraints = vec![Vec::new(); resources.len()];
        for (i, c) in constraints.iter().enumerate() {
            let id = ConstraintId::new(i);
            if c.weight < 0 {
                return Err(ModelError::Invalid(format!(
                    "constraint {} has negative weight",
                    c.name
                )));
            }
            match &c.kind {
                ConstraintKind::AssignTime { events: es } => check_events(es)?,
                ConstraintKind::PreferTimes { events: es, times } => {
                    check_events(es)?;
                    check_times(times)?;
                }
                ConstraintKind::AvoidUnavailableTimes { resources: rs, times } => {
                    check_resources(rs)?;
                    check_times(times)?;
                }
                ConstraintKind::LimitBusyTimes {
                    resources: rs,
                    time_groups,
                    ..
                } => {
                    check_resources(rs)?;
                    for tg in time_groups {
                        check_times(tg)?;
                    }
                }
                ConstraintKind::LimitWorkload { resources: rs, .. } => check_resources(rs)?,
                ConstraintKind::LinkEvents { event_groups } => {
                    for g in event_groups {
                        check_events(g)?;
                    }
                }
            }
            for e in c.events() {
                event_time_constraints[e.index()].push(id);
            }
            for r in c.resources() {
                resource_constraints[r.index()].push(id);
            }
        }

        let mut resource_layer_events = vec![Vec::new(); resources.len()];
        let mut resource_layer_durations = vec![0; resources.len()];
        for (i, event) in events.iter().enumerate() {
            for er in &event.resources {
                if let Some(r) = er.preassigned {
                    let list: &mut Vec<EventId> = &mut resource_layer_events[r.index()];
                    if list.last() != Some(&EventId::new(i)) {
                        list.push(EventId::new(i));
                        resource_layer_durations[r.index()] += event.duration;
                    }
                }
            }
        }

        Ok(Instance {
            name: name.into(),
            times,
            blocks,
            time_blocks,
            resource_types,
            resources,
            events,
            constraints,
            event_time_constraints,
            resource_constraints,
            resource_layer_events,
            resource_layer_durations,
        })
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
