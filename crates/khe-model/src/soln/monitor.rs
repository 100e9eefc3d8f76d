//! Group monitors over demand nodes, and traces of their changes.

use std::collections::BTreeSet;

use khe_core::Cost;

use super::{Soln, UndoOp};
use crate::ids::{DemandId, GroupMonitorId};

/// Identifies what a group monitor is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorTag {
    /// The demand nodes of preassigned tasks, traced by Kempe meet moves.
    KempeDemand,
    /// Any other grouping.
    Custom(u32),
}

#[derive(Debug, Clone)]
pub(crate) struct GroupMonitorData {
    pub(crate) tag: MonitorTag,
    pub(crate) members: Vec<DemandId>,
}

#[derive(Debug, Clone)]
pub(crate) struct TraceState {
    group: GroupMonitorId,
    entries: Vec<(DemandId, Cost)>,
    seen: BTreeSet<DemandId>,
}

/// The demand nodes of one group monitor that changed while a trace was
/// open, each with its cost when the trace began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    group: GroupMonitorId,
    entries: Vec<(DemandId, Cost)>,
}

impl Trace {
    pub fn group(&self) -> GroupMonitorId {
        self.group
    }

    pub fn monitor_count(&self) -> usize {
        self.entries.len()
    }

    pub fn monitor(&self, i: usize) -> DemandId {
        self.entries[i].0
    }

    pub fn init_cost(&self, i: usize) -> Cost {
        self.entries[i].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (DemandId, Cost)> + '_ {
        self.entries.iter().copied()
    }

    /// Traced demand nodes whose cost is now higher than initially.
    pub fn worsened<'a>(&'a self, soln: &'a Soln) -> impl Iterator<Item = DemandId> + 'a {
        self.entries
            .iter()
            .filter(move |(dn, init)| soln.demand_cost(*dn) > *init)
            .map(|(dn, _)| *dn)
    }
}

impl Soln {
    pub fn group_monitor_make(&mut self, tag: MonitorTag) -> GroupMonitorId {
        self.group_monitors.push(GroupMonitorData {
            tag,
            members: Vec::new(),
        });
        GroupMonitorId::new(self.group_monitors.len() - 1)
    }

    /// Adds `dn` to `group`, unless it is a member already. Undone by marks.
    pub fn group_monitor_add_demand(&mut self, group: GroupMonitorId, dn: DemandId) {
        let groups = &mut self.matching.demand[dn.index()].groups;
        if !groups.contains(&group) {
            groups.push(group);
            self.group_monitors[group.index()].members.push(dn);
            self.log(UndoOp::GroupMonitorAddDemand(group, dn));
        }
    }

    pub fn group_monitor_tag(&self, group: GroupMonitorId) -> MonitorTag {
        self.group_monitors[group.index()].tag
    }

    pub fn group_monitor_members(&self, group: GroupMonitorId) -> &[DemandId] {
        &self.group_monitors[group.index()].members
    }

    pub fn group_monitor_cost(&self, group: GroupMonitorId) -> Cost {
        self.group_monitors[group.index()]
            .members
            .iter()
            .map(|dn| self.demand_cost(*dn))
            .sum()
    }

    /// The group monitor with tag `tag` that `dn` belongs to, if any.
    pub fn demand_group_monitor(&self, dn: DemandId, tag: MonitorTag) -> Option<GroupMonitorId> {
        self.matching.demand[dn.index()]
            .groups
            .iter()
            .copied()
            .find(|g| self.group_monitors[g.index()].tag == tag)
    }

    /// Starts tracing changes to the members of `group`.
    ///
    /// # Panics
    ///
    /// Panics if a trace is already open.
    pub fn trace_begin(&mut self, group: GroupMonitorId) {
        assert!(self.trace.is_none(), "trace_begin: a trace is already open");
        self.trace = Some(TraceState {
            group,
            entries: Vec::new(),
            seen: BTreeSet::new(),
        });
    }

    /// Ends the open trace and returns what it recorded.
    pub fn trace_end(&mut self) -> Trace {
        let state = match self.trace.take() {
            Some(state) => state,
            None => panic!("trace_end: no trace is open"),
        };
        Trace {
            group: state.group,
            entries: state.entries,
        }
    }

    /// Records `dn` in the open trace, before its first change.
    pub(crate) fn trace_notify(&mut self, dn: DemandId) {
        let Some(group) = self.trace.as_ref().map(|t| t.group) else {
            return;
        };
        if !self.matching.demand[dn.index()].groups.contains(&group) {
            return;
        }
        let cost = self.demand_cost(dn);
        if let Some(trace) = &mut self.trace {
            if trace.seen.insert(dn) {
                trace.entries.push((dn, cost));
            }
        }
    }
}
