//! Time equivalence.
//!
//! Two events are time-equivalent when the fixed assignments of the
//! solution force their meets to run at the same times. Two resources of a
//! type whose event resources are all preassigned are time-equivalent when
//! they attend the same groups of time-equivalent events.

use khe_model::{EventId, MeetId, ResourceId, ResourceTypeId, Soln};
use smallvec::SmallVec;
use tracing::debug;

/// Where a meet sits at the end of its chain of fixed assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MeetFrame {
    leader: MeetId,
    offset: usize,
    duration: usize,
}

type EventFrame = SmallVec<[MeetFrame; 4]>;

fn event_frame(soln: &Soln, e: EventId) -> EventFrame {
    let mut frame: EventFrame = soln
        .event_meets(e)
        .iter()
        .map(|m| {
            let (leader, offset) = soln.meet_last_fixed(*m);
            MeetFrame {
                leader,
                offset,
                duration: soln.meet_duration(*m),
            }
        })
        .collect();
    frame.sort();
    frame
}

/// Event and resource groups of time-equivalent elements.
///
/// # Example
///
/// ```
/// use khe_solver::TimeEquiv;
/// use khe_test::{school, soln_of};
///
/// let soln = soln_of(school(4, 2, &[(1, Some(0)), (1, Some(1))]));
/// let te = TimeEquiv::solve(&soln);
///
/// // nothing is fixed, so every event stands alone
/// assert_eq!(te.event_group_count(), 2);
/// assert_eq!(te.resource_group_count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimeEquiv {
    event_groups: Vec<Vec<EventId>>,
    event_group_indexes: Vec<usize>,
    resource_groups: Vec<Vec<ResourceId>>,
    resource_group_indexes: Vec<usize>,
}

/// Event groups under construction: a store of groups, each sorted by
/// event index, and the group of each event.
struct EventGroups {
    store: Vec<Vec<EventId>>,
    by_event: Vec<usize>,
}

impl EventGroups {
    fn singletons(event_count: usize) -> Self {
        Self {
            store: (0..event_count).map(|i| vec![EventId::new(i)]).collect(),
            by_event: (0..event_count).collect(),
        }
    }

    fn leader(&self, e: EventId) -> EventId {
        self.store[self.by_event[e.index()]][0]
    }

    fn install(&mut self, mut events: Vec<EventId>) {
        events.sort();
        let g = self.store.len();
        for e in &events {
            self.by_event[e.index()] = g;
        }
        self.store.push(events);
    }

    /// Merges the groups of the events of `meet` and of every meet fixed,
    /// directly or indirectly, to it.
    fn merge_related(&mut self, soln: &Soln, meet: MeetId) {
        let mut groups: SmallVec<[usize; 4]> = SmallVec::new();
        let mut stack = vec![meet];
        while let Some(m) = stack.pop() {
            if let Some(e) = soln.meet_event(m) {
                let g = self.by_event[e.index()];
                if !groups.contains(&g) {
                    groups.push(g);
                }
            }
            stack.extend(
                soln.meet_assigned_meets(m)
                    .iter()
                    .copied()
                    .filter(|sub| soln.meet_is_fixed(*sub)),
            );
        }
        if groups.len() >= 2 {
            let events = groups
                .iter()
                .flat_map(|g| self.store[*g].iter().copied())
                .collect();
            self.install(events);
        }
    }

    /// Splits the group led by `leader` into runs of events with equal
    /// frames.
    fn break_up(&mut self, soln: &Soln, leader: EventId) {
        let group = self.store[self.by_event[leader.index()]].clone();
        let mut frames: Vec<(EventFrame, EventId)> = group
            .iter()
            .map(|e| (event_frame(soln, *e), *e))
            .collect();
        frames.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.cmp(b)));
        let mut i = 0;
        while i < frames.len() {
            let mut j = i + 1;
            while j < frames.len() && frames[j].0 == frames[i].0 {
                j += 1;
            }
            if j - i != frames.len() {
                self.install(frames[i..j].iter().map(|(_, e)| *e).collect());
            }
            i = j;
        }
    }
}

fn all_preassigned(soln: &Soln, rt: ResourceTypeId) -> bool {
    let instance = soln.instance();
    instance.events().all(|e| {
        instance
            .event(e)
            .resources
            .iter()
            .all(|er| er.resource_type != rt || er.preassigned.is_some())
    })
}

impl TimeEquiv {
    /// Computes the groups for `soln`.
    pub fn solve(soln: &Soln) -> Self {
        let instance = soln.instance();
        let mut groups = EventGroups::singletons(instance.event_count());

        for meet in soln.meets() {
            if !soln.meet_is_cycle_meet(meet) && !soln.meet_is_fixed(meet) {
                groups.merge_related(soln, meet);
            }
        }

        for e in instance.events() {
            if groups.leader(e) == e && groups.store[groups.by_event[e.index()]].len() >= 2 {
                groups.break_up(soln, e);
            }
        }

        let mut te = TimeEquiv {
            event_group_indexes: vec![0; instance.event_count()],
            ..Default::default()
        };
        for e in instance.events() {
            if groups.leader(e) == e {
                let group = groups.store[groups.by_event[e.index()]].clone();
                for member in &group {
                    te.event_group_indexes[member.index()] = te.event_groups.len();
                }
                te.event_groups.push(group);
            }
        }

        let mut resource_groups: Vec<Vec<ResourceId>> =
            instance.resources().map(|r| vec![r]).collect();
        for i in 0..instance.resource_type_count() {
            let rt = ResourceTypeId::new(i);
            if !all_preassigned(soln, rt) {
                continue;
            }
            let mut frames: Vec<(Vec<EventId>, ResourceId)> = instance
                .resources_of_type(rt)
                .map(|r| {
                    let mut leaders: Vec<EventId> = instance
                        .resource_layer_events(r)
                        .iter()
                        .map(|e| groups.leader(*e))
                        .collect();
                    leaders.sort();
                    leaders.dedup();
                    (leaders, r)
                })
                .collect();
            frames.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.cmp(b)));
            let mut runs = 0;
            for run in frames.chunk_by(|a, b| a.0 == b.0) {
                runs += 1;
                if run.len() > 1 {
                    let mut members: Vec<ResourceId> = run.iter().map(|(_, r)| *r).collect();
                    members.sort();
                    for r in &members {
                        resource_groups[r.index()] = members.clone();
                    }
                }
            }
            debug!(resource_type = %rt, groups = runs, "grouped preassigned resources");
        }

        te.resource_group_indexes = vec![0; instance.resource_count()];
        for (i, group) in resource_groups.into_iter().enumerate() {
            if group[0].index() == i {
                for r in &group {
                    te.resource_group_indexes[r.index()] = te.resource_groups.len();
                }
                te.resource_groups.push(group);
            }
        }

        debug!(
            events = te.event_groups.len(),
            resources = te.resource_groups.len(),
            "time equivalence"
        );
        te
    }

    pub fn event_group_count(&self) -> usize {
        self.event_groups.len()
    }

    /// The `i`th event group, sorted by event index.
    pub fn event_group(&self, i: usize) -> &[EventId] {
        &self.event_groups[i]
    }

    /// Index of the group holding `e`.
    pub fn event_group_index(&self, e: EventId) -> usize {
        self.event_group_indexes[e.index()]
    }

    pub fn event_group_of(&self, e: EventId) -> &[EventId] {
        self.event_group(self.event_group_index(e))
    }

    pub fn resource_group_count(&self) -> usize {
        self.resource_groups.len()
    }

    pub fn resource_group(&self, i: usize) -> &[ResourceId] {
        &self.resource_groups[i]
    }

    pub fn resource_group_index(&self, r: ResourceId) -> usize {
        self.resource_group_indexes[r.index()]
    }

    pub fn resource_group_of(&self, r: ResourceId) -> &[ResourceId] {
        self.resource_group(self.resource_group_index(r))
    }
}

#[cfg(test)]
#[path = "time_equiv_tests.rs"]
mod tests;
