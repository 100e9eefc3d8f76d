//! Meets: creation, assignment, domains and queries.

use khe_core::{Cost, LSet};

use super::{MeetData, Soln, UndoOp};
use crate::ids::{DemandId, EventId, MeetId, NodeId, TaskId, TimeId};
use crate::instance::ConstraintKind;

impl Soln {
    /// Creates a meet with no event, no tasks and an automatic domain.
    pub fn meet_make(&mut self, duration: usize) -> MeetId {
        assert!(duration > 0, "meet_make: zero duration");
        self.push_meet(MeetData::new(duration, None, None))
    }

    /// Creates a meet with the given starting-time domain.
    pub fn meet_make_with_domain(&mut self, duration: usize, domain: LSet) -> MeetId {
        assert!(duration > 0, "meet_make_with_domain: zero duration");
        self.push_meet(MeetData::new(duration, None, Some(domain)))
    }

    /// Deletes a meet, removing it from its node, zones and meet bounds.
    ///
    /// # Panics
    ///
    /// Panics if the meet is assigned, has meets assigned to it, has tasks,
    /// or is a cycle meet.
    pub fn meet_delete(&mut self, meet: MeetId) {
        let m = self.meet_data(meet);
        assert!(m.asst.is_none(), "meet_delete: {} is assigned", meet);
        assert!(m.assigned.is_empty(), "meet_delete: {} has assigned meets", meet);
        assert!(m.tasks.is_empty(), "meet_delete: {} has tasks", meet);
        assert!(m.cycle_start.is_none(), "meet_delete: {} is a cycle meet", meet);
        let duration = m.duration;
        for offset in 0..duration {
            if let Some(zone) = self.meet_data(meet).zones[offset] {
                self.zone_delete_meet_offset(zone, meet, offset);
            }
        }
        while let Some(&bound) = self.meet_data(meet).bounds.last() {
            self.meet_delete_meet_bound(meet, bound);
        }
        if let Some(node) = self.meet_data(meet).node {
            self.node_delete_meet(node, meet);
        }
        if let Some(data) = self.meets[meet.index()].take() {
            self.log(UndoOp::MeetDelete(meet, Box::new(data)));
        }
    }

    /// True when `meet` exists (has not been deleted).
    pub fn meet_exists(&self, meet: MeetId) -> bool {
        self.meets.get(meet.index()).is_some_and(Option::is_some)
    }

    /// Number of live meets, cycle meets included.
    pub fn meet_count(&self) -> usize {
        self.meets.iter().filter(|m| m.is_some()).count()
    }

    /// Iterates over live meets in creation order.
    pub fn meets(&self) -> impl Iterator<Item = MeetId> + '_ {
        self.meets
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_some())
            .map(|(i, _)| MeetId::new(i))
    }

    pub fn meet_duration(&self, meet: MeetId) -> usize {
        self.meet_data(meet).duration
    }

    pub fn meet_event(&self, meet: MeetId) -> Option<EventId> {
        self.meet_data(meet).event
    }

    pub fn meet_node(&self, meet: MeetId) -> Option<NodeId> {
        self.meet_data(meet).node
    }

    pub fn meet_asst(&self, meet: MeetId) -> Option<MeetId> {
        self.meet_data(meet).asst.map(|(t, _)| t)
    }

    pub fn meet_asst_offset(&self, meet: MeetId) -> Option<usize> {
        self.meet_data(meet).asst.map(|(_, o)| o)
    }

    pub fn meet_asst_pair(&self, meet: MeetId) -> Option<(MeetId, usize)> {
        self.meet_data(meet).asst
    }

    /// Meets assigned directly to `meet`.
    pub fn meet_assigned_meets(&self, meet: MeetId) -> &[MeetId] {
        &self.meet_data(meet).assigned
    }

    pub fn meet_tasks(&self, meet: MeetId) -> &[TaskId] {
        &self.meet_data(meet).tasks
    }

    pub fn meet_is_cycle_meet(&self, meet: MeetId) -> bool {
        self.meet_data(meet).cycle_start.is_some()
    }

    pub fn meet_is_fixed(&self, meet: MeetId) -> bool {
        self.meet_data(meet).fixed
    }

    /// The effective starting-time domain: the meet's own domain narrowed
    /// by its meet bounds. `None` means automatic.
    pub fn meet_domain(&self, meet: MeetId) -> Option<LSet> {
        let m = self.meet_data(meet);
        let mut domain = m.domain.clone();
        for bound in &m.bounds {
            let bd = &self.bound_data(*bound).domain;
            domain = Some(match domain {
                Some(mut d) => {
                    d.intersection(bd);
                    d
                }
                None => bd.clone(),
            });
        }
        domain
    }

    /// Replaces the meet's own domain; `None` makes it automatic.
    ///
    /// Fails without change when the current assignment or the meets
    /// assigned to it would no longer be allowed.
    pub fn meet_set_domain(&mut self, meet: MeetId, domain: Option<LSet>) -> bool {
        let prev = self.meet_data(meet).domain.clone();
        self.meet_data_mut(meet).domain = domain;
        if !self.meet_asst_still_allowed(meet) {
            self.meet_data_mut(meet).domain = prev;
            return false;
        }
        self.log(UndoOp::MeetSetDomain { meet, prev });
        let dns = self.meet_subtree_demand(meet);
        self.matching_revise(&dns);
        true
    }

    /// True when the assignment of `meet` and the assignments into it are
    /// allowed by the current domains.
    pub(crate) fn meet_asst_still_allowed(&self, meet: MeetId) -> bool {
        let m = self.meet_data(meet);
        if let Some((target, offset)) = m.asst {
            if !self.domains_allow_assignment(meet, target, offset) {
                return false;
            }
        }
        m.assigned.iter().all(|child| match self.meet_data(*child).asst {
            Some((t, o)) => self.domains_allow_assignment(*child, t, o),
            None => true,
        })
    }

    /// The start time of `meet`, when it is grounded in a cycle meet.
    pub fn meet_asst_time(&self, meet: MeetId) -> Option<TimeId> {
        let mut cur = meet;
        let mut offset = 0;
        loop {
            let m = self.meet_data(cur);
            if let Some(start) = m.cycle_start {
                return Some(TimeId::new(start.index() + offset));
            }
            let (target, o) = m.asst?;
            offset += o;
            cur = target;
        }
    }

    /// Follows fixed assignments upwards, returning the last meet reached
    /// and the accumulated offset.
    pub fn meet_last_fixed(&self, meet: MeetId) -> (MeetId, usize) {
        let mut cur = meet;
        let mut offset = 0;
        while let Some((target, o)) = self.meet_data(cur).asst {
            if !self.meet_data(cur).fixed {
                break;
            }
            offset += o;
            cur = target;
        }
        (cur, offset)
    }

    /// The root of the assignment chain of `meet`, and the offset of `meet`
    /// within it.
    pub fn meet_root(&self, meet: MeetId) -> (MeetId, usize) {
        let mut cur = meet;
        let mut offset = 0;
        while let Some((target, o)) = self.meet_data(cur).asst {
            offset += o;
            cur = target;
        }
        (cur, offset)
    }

    /// The preassigned time of the meet's event, if any.
    pub fn meet_is_preassigned(&self, meet: MeetId) -> Option<TimeId> {
        let event = self.meet_data(meet).event?;
        self.instance().event(event).preassigned_time
    }

    /// Number of demand nodes in the tasks of `meet` and of all meets
    /// assigned to it, directly or indirectly.
    pub fn meet_demand(&self, meet: MeetId) -> usize {
        self.meet_subtree(meet)
            .iter()
            .map(|m| {
                let data = self.meet_data(*m);
                data.tasks.len() * data.duration
            })
            .sum()
    }

    /// `meet` followed by every meet assigned to it, directly or not.
    pub fn meet_subtree(&self, meet: MeetId) -> Vec<MeetId> {
        let mut res = vec![meet];
        let mut i = 0;
        while i < res.len() {
            res.extend_from_slice(&self.meet_data(res[i]).assigned);
            i += 1;
        }
        res
    }

    pub(crate) fn meet_subtree_demand(&self, meet: MeetId) -> Vec<DemandId> {
        self.meet_subtree(meet)
            .iter()
            .flat_map(|m| self.meet_data(*m).tasks.iter())
            .flat_map(|t| self.tasks[t.index()].demand.iter().copied())
            .collect()
    }

    /// True when `ancestor` is `meet` or lies on its assignment chain.
    pub fn meet_has_ancestor(&self, meet: MeetId, ancestor: MeetId) -> bool {
        let mut cur = Some(meet);
        while let Some(m) = cur {
            if m == ancestor {
                return true;
            }
            cur = self.meet_data(m).asst.map(|(t, _)| t);
        }
        false
    }

    /// The starting times `meet` could have, given where it is assigned.
    pub fn meet_start_domain(&self, meet: MeetId) -> LSet {
        let time_count = self.instance().time_count();
        let (root, offset) = self.meet_root(meet);
        let root_data = self.meet_data(root);
        if let Some(start) = root_data.cycle_start {
            let t = start.index() + offset;
            return if t < time_count {
                LSet::singleton(t)
            } else {
                LSet::new()
            };
        }
        let mut res = match self.meet_domain(root) {
            Some(d) => d.shift(offset as isize, time_count),
            None => self.instance().all_times(),
        };
        if root != meet {
            if let Some(own) = self.meet_domain(meet) {
                res.intersection(&own);
            }
        }
        res
    }

    fn domain_allows_starts(&self, meet: MeetId, starts: &LSet) -> bool {
        let time_count = self.instance().time_count();
        match self.meet_domain(meet) {
            Some(d) => starts.is_subset(&d),
            None => self.meet_data(meet).assigned.iter().all(|child| {
                let offset = self.meet_data(*child).asst.map_or(0, |(_, o)| o);
                self.domain_allows_starts(*child, &starts.shift(offset as isize, time_count))
            }),
        }
    }

    /// True when the domain of the nearest ancestor of `target` with a
    /// non-automatic domain, shifted by the accumulated offset, lies within
    /// the domain of `meet`.
    pub(crate) fn domains_allow_assignment(
        &self,
        meet: MeetId,
        target: MeetId,
        offset: usize,
    ) -> bool {
        let mut cur = target;
        let mut off = offset;
        let ancestor_domain = loop {
            if let Some(d) = self.meet_domain(cur) {
                break d;
            }
            match self.meet_data(cur).asst {
                Some((t, o)) => {
                    off += o;
                    cur = t;
                }
                None => return true,
            }
        };
        let starts = ancestor_domain.shift(off as isize, self.instance().time_count());
        self.domain_allows_starts(meet, &starts)
    }

    /// True when `meet` may move to `target`, where `None` means unassign.
    pub fn meet_move_check(&self, meet: MeetId, target: Option<(MeetId, usize)>) -> bool {
        let m = self.meet_data(meet);
        if m.fixed || m.cycle_start.is_some() {
            return false;
        }
        let Some((target, offset)) = target else {
            return m.asst.is_some();
        };
        if m.asst == Some((target, offset)) {
            return false;
        }
        let t = self.meet_data(target);
        if offset + m.duration > t.duration {
            return false;
        }
        if !self.domains_allow_assignment(meet, target, offset) {
            return false;
        }
        if let Some(node) = m.node {
            match self.node_data(node).parent {
                Some(parent) if t.node == Some(parent) => {}
                _ => return false,
            }
        }
        !self.meet_has_ancestor(target, meet)
    }

    /// Moves `meet` to `target` at `offset`, or unassigns it when `target`
    /// is `None`. Returns false, changing nothing, when the move is not
    /// allowed.
    pub fn meet_move(&mut self, meet: MeetId, target: Option<(MeetId, usize)>) -> bool {
        if !self.meet_move_check(meet, target) {
            return false;
        }
        self.meet_move_unchecked(meet, target);
        true
    }

    pub fn meet_assign_check(&self, meet: MeetId, target: MeetId, offset: usize) -> bool {
        self.meet_data(meet).asst.is_none() && self.meet_move_check(meet, Some((target, offset)))
    }

    /// Assigns the unassigned `meet` to `target` at `offset`.
    pub fn meet_assign(&mut self, meet: MeetId, target: MeetId, offset: usize) -> bool {
        if !self.meet_assign_check(meet, target, offset) {
            return false;
        }
        self.meet_move_unchecked(meet, Some((target, offset)));
        true
    }

    pub fn meet_unassign_check(&self, meet: MeetId) -> bool {
        self.meet_move_check(meet, None)
    }

    pub fn meet_unassign(&mut self, meet: MeetId) -> bool {
        self.meet_move(meet, None)
    }

    /// The cycle meet and offset representing time `t`.
    pub fn time_cycle_meet(&self, t: TimeId) -> (MeetId, usize) {
        let (block, offset) = self.instance().time_block(t);
        (self.cycle_meets()[block], offset)
    }

    /// Moves `meet` so that it starts at time `t`.
    pub fn meet_move_time(&mut self, meet: MeetId, t: TimeId) -> bool {
        let target = self.time_cycle_meet(t);
        self.meet_move(meet, Some(target))
    }

    /// Assigns the unassigned `meet` so that it starts at time `t`.
    pub fn meet_assign_time(&mut self, meet: MeetId, t: TimeId) -> bool {
        let (target, offset) = self.time_cycle_meet(t);
        self.meet_assign(meet, target, offset)
    }

    /// Fixes the assignment of the assigned `meet`.
    pub fn meet_assign_fix(&mut self, meet: MeetId) {
        assert!(
            self.meet_data(meet).asst.is_some(),
            "meet_assign_fix: {} is unassigned",
            meet
        );
        let prev = std::mem::replace(&mut self.meet_data_mut(meet).fixed, true);
        self.log(UndoOp::MeetSetFixed { meet, prev });
    }

    pub fn meet_assign_unfix(&mut self, meet: MeetId) {
        let prev = std::mem::replace(&mut self.meet_data_mut(meet).fixed, false);
        self.log(UndoOp::MeetSetFixed { meet, prev });
    }

    pub(crate) fn meet_move_unchecked(&mut self, meet: MeetId, target: Option<(MeetId, usize)>) {
        let before = self.subtree_time_cost(meet);
        let prev = self.raw_meet_move(meet, target);
        self.log(UndoOp::MeetMove { meet, prev });
        self.time_cost += self.subtree_time_cost(meet) - before;
        let dns = self.meet_subtree_demand(meet);
        self.matching_revise(&dns);
    }

    /// Changes the assignment of `meet` with no checks or cost updates,
    /// returning the previous assignment.
    pub(crate) fn raw_meet_move(
        &mut self,
        meet: MeetId,
        target: Option<(MeetId, usize)>,
    ) -> Option<(MeetId, usize)> {
        let prev = std::mem::replace(&mut self.meet_data_mut(meet).asst, target);
        if let Some((old, _)) = prev {
            let assigned = &mut self.meet_data_mut(old).assigned;
            if let Some(pos) = assigned.iter().position(|m| *m == meet) {
                assigned.remove(pos);
            }
        }
        if let Some((new, _)) = target {
            self.meet_data_mut(new).assigned.push(meet);
        }
        prev
    }

    /// Assign-time and prefer-times cost of one event meet.
    pub(crate) fn meet_time_cost(&self, meet: MeetId) -> Cost {
        let m = self.meet_data(meet);
        let Some(event) = m.event else {
            return Cost::ZERO;
        };
        let time = self.meet_asst_time(meet);
        let instance = self.instance();
        instance
            .event_time_constraints(event)
            .iter()
            .map(|c| {
                let constraint = instance.constraint(*c);
                let violated = match (&constraint.kind, time) {
                    (ConstraintKind::AssignTime { .. }, None) => true,
                    (ConstraintKind::PreferTimes { times, .. }, Some(t)) => {
                        !times.contains(t.index())
                    }
                    _ => false,
                };
                if violated {
                    constraint.combined_weight() * m.duration as i64
                } else {
                    Cost::ZERO
                }
            })
            .sum()
    }

    pub(crate) fn subtree_time_cost(&self, meet: MeetId) -> Cost {
        self.meet_subtree(meet)
            .iter()
            .map(|m| self.meet_time_cost(*m))
            .sum()
    }
}
