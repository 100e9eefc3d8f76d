//! Workload requirements.
//!
//! Compiles each resource's unavailable times, busy-time limits and
//! workload limits into workload requirements on the matching, so that
//! time assignment sees a resource's supply shrink where its constraints
//! say it should not be busy.

use std::cmp::Ordering;

use khe_core::{Cost, LSet};
use khe_model::{ConstraintId, ConstraintKind, EventId, Instance, ResourceId, Soln};
use tracing::{debug, trace};

/// Events known to run simultaneously, with at least one event resource
/// whose workload differs from its event's duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCluster {
    pub events: Vec<EventId>,
}

impl EventCluster {
    /// How much `r`'s workload limit grows because of this cluster.
    ///
    /// When `r` must be assigned to some event resource here, the sum of
    /// `duration - workload` over those; otherwise, when it may be, the
    /// largest such difference; otherwise 0.
    pub fn resource_adjustment(&self, instance: &Instance, r: ResourceId) -> isize {
        let mut must: Option<isize> = None;
        let mut may: Option<isize> = None;
        for e in &self.events {
            let event = instance.event(*e);
            for er in &event.resources {
                if !er.domain.contains(r.index()) {
                    continue;
                }
                let diff = event.duration as isize - er.workload as isize;
                if er.domain.len() == 1 {
                    *must.get_or_insert(0) += diff;
                } else {
                    may = Some(may.map_or(diff.max(0), |m| m.max(diff)));
                }
            }
        }
        must.or(may).unwrap_or(0)
    }
}

/// Builds the clusters of `instance`'s events that contain special
/// workloads.
///
/// Events preassigned the same time share a cluster; clusters are then
/// merged along the event groups of required link-events constraints of
/// positive weight.
pub fn event_clusters(instance: &Instance) -> Vec<EventCluster> {
    let mut by_time: Vec<Option<usize>> = vec![None; instance.time_count()];
    let mut clusters: Vec<Option<Vec<EventId>>> = Vec::new();
    let mut of_event: Vec<usize> = Vec::with_capacity(instance.event_count());
    for e in instance.events() {
        let slot = match instance.event(e).preassigned_time {
            Some(t) => match by_time[t.index()] {
                Some(c) => {
                    if let Some(events) = clusters[c].as_mut() {
                        events.push(e);
                    }
                    c
                }
                None => {
                    clusters.push(Some(vec![e]));
                    by_time[t.index()] = Some(clusters.len() - 1);
                    clusters.len() - 1
                }
            },
            None => {
                clusters.push(Some(vec![e]));
                clusters.len() - 1
            }
        };
        of_event.push(slot);
    }

    for c in instance.constraints() {
        let constraint = instance.constraint(c);
        let ConstraintKind::LinkEvents { event_groups } = &constraint.kind else {
            continue;
        };
        if !constraint.required || constraint.weight <= 0 {
            continue;
        }
        for group in event_groups {
            for pair in group.windows(2) {
                let (keep, gone) = (of_event[pair[0].index()], of_event[pair[1].index()]);
                if keep == gone {
                    continue;
                }
                let moved = clusters[gone].take().unwrap_or_default();
                for e in &moved {
                    of_event[e.index()] = keep;
                }
                if let Some(events) = clusters[keep].as_mut() {
                    events.extend(moved);
                }
            }
        }
    }

    clusters
        .into_iter()
        .flatten()
        .filter(|events| {
            events
                .iter()
                .any(|e| instance.event(*e).has_special_workload())
        })
        .map(|events| EventCluster { events })
        .collect()
}

fn requirement_cmp(instance: &Instance, c1: ConstraintId, c2: ConstraintId) -> Ordering {
    let w1 = instance.constraint(c1).combined_weight();
    let w2 = instance.constraint(c2).combined_weight();
    w2.cmp(&w1).then(c1.cmp(&c2))
}

fn avoid_times(soln: &mut Soln, r: ResourceId, times: &LSet, c: ConstraintId) {
    for t in times.iter() {
        soln.matching_add_workload_requirement(r, 0, LSet::singleton(t), c);
    }
}

fn add_requirements(soln: &mut Soln, r: ResourceId, clusters: &[EventCluster]) {
    let instance = soln.instance().clone();
    let mut constraints: Vec<ConstraintId> = instance
        .resource_constraints(r)
        .iter()
        .copied()
        .filter(|c| {
            let constraint = instance.constraint(*c);
            matches!(
                constraint.kind,
                ConstraintKind::AvoidUnavailableTimes { .. }
                    | ConstraintKind::LimitBusyTimes { .. }
                    | ConstraintKind::LimitWorkload { .. }
            ) && constraint.combined_weight() >= Cost::ONE_HARD
        })
        .collect();
    constraints.sort_by(|a, b| requirement_cmp(&instance, *a, *b));

    soln.matching_begin_workload_requirements(r);
    for c in constraints {
        match &instance.constraint(c).kind {
            ConstraintKind::AvoidUnavailableTimes { times, .. } => {
                avoid_times(soln, r, times, c);
            }
            ConstraintKind::LimitBusyTimes {
                time_groups,
                maximum,
                ..
            } => {
                for tg in time_groups {
                    if *maximum == 0 {
                        avoid_times(soln, r, tg, c);
                    } else if *maximum < tg.len() {
                        soln.matching_add_workload_requirement(r, *maximum, tg.clone(), c);
                    }
                }
            }
            ConstraintKind::LimitWorkload { maximum, .. } => {
                let adjusted = clusters
                    .iter()
                    .map(|ec| ec.resource_adjustment(&instance, r))
                    .sum::<isize>()
                    + *maximum as isize;
                let limit = adjusted.max(0) as usize;
                trace!(resource = %r, maximum, limit, "workload limit");
                if limit < instance.time_count() {
                    soln.matching_add_workload_requirement(r, limit, instance.all_times(), c);
                }
            }
            _ => unreachable!("add_requirements: filtered constraint kind"),
        }
    }
    soln.matching_end_workload_requirements(r);
}

/// Adds workload requirements for every resource of `soln`'s instance.
///
/// Only constraints of combined weight at least one hard unit count, taken
/// in decreasing weight order (ties by constraint index). Must be called
/// outside any mark.
pub fn workload_requirements(soln: &mut Soln) {
    let instance = soln.instance().clone();
    let clusters = event_clusters(&instance);
    debug!(clusters = clusters.len(), "event clusters with special workloads");
    for r in instance.resources() {
        add_requirements(soln, r, &clusters);
    }
    debug!(cost = %soln.cost(), "added workload requirements");
}

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;
