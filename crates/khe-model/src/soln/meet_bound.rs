//! Meet bounds: extra restrictions on the starting times of meets.
//!
//! A bound belongs to a group; deleting the group deletes its bounds and
//! lifts their restrictions from every meet they were added to.

use khe_core::LSet;

use super::{MeetBoundData, MeetBoundGroupData, Soln, UndoOp};
use crate::ids::{MeetBoundGroupId, MeetBoundId, MeetId};

impl Soln {
    pub(crate) fn bound_data(&self, bound: MeetBoundId) -> &MeetBoundData {
        match &self.bounds[bound.index()] {
            Some(b) => b,
            None => panic!("{} has been deleted", bound),
        }
    }

    pub(crate) fn bound_data_mut(&mut self, bound: MeetBoundId) -> &mut MeetBoundData {
        match &mut self.bounds[bound.index()] {
            Some(b) => b,
            None => panic!("{} has been deleted", bound),
        }
    }

    pub(crate) fn bound_group_data_mut(
        &mut self,
        group: MeetBoundGroupId,
    ) -> &mut MeetBoundGroupData {
        match &mut self.bound_groups[group.index()] {
            Some(g) => g,
            None => panic!("{} has been deleted", group),
        }
    }

    pub fn meet_bound_group_make(&mut self) -> MeetBoundGroupId {
        self.bound_groups.push(Some(MeetBoundGroupData::default()));
        let group = MeetBoundGroupId::new(self.bound_groups.len() - 1);
        self.log(UndoOp::BoundGroupMake(group));
        group
    }

    /// Deletes `group` and every bound in it.
    pub fn meet_bound_group_delete(&mut self, group: MeetBoundGroupId) {
        while let Some(&bound) = self.bound_group_data_mut(group).bounds.last() {
            self.meet_bound_delete(bound);
        }
        if let Some(data) = self.bound_groups[group.index()].take() {
            self.log(UndoOp::BoundGroupDelete(group, Box::new(data)));
        }
    }

    pub fn meet_bound_group_bounds(&self, group: MeetBoundGroupId) -> &[MeetBoundId] {
        match &self.bound_groups[group.index()] {
            Some(g) => &g.bounds,
            None => panic!("{} has been deleted", group),
        }
    }

    /// Creates a bound in `group` restricting starting times to `domain`.
    pub fn meet_bound_make(&mut self, group: MeetBoundGroupId, domain: LSet) -> MeetBoundId {
        self.bounds.push(Some(MeetBoundData {
            group,
            domain,
            meets: Vec::new(),
        }));
        let bound = MeetBoundId::new(self.bounds.len() - 1);
        self.bound_group_data_mut(group).bounds.push(bound);
        self.log(UndoOp::BoundMake(bound));
        bound
    }

    /// Deletes `bound`, first removing it from every meet.
    pub fn meet_bound_delete(&mut self, bound: MeetBoundId) {
        while let Some(&meet) = self.bound_data(bound).meets.last() {
            self.meet_delete_meet_bound(meet, bound);
        }
        let group = self.bound_data(bound).group;
        let bounds = &mut self.bound_group_data_mut(group).bounds;
        if let Some(pos) = bounds.iter().position(|b| *b == bound) {
            bounds.remove(pos);
        }
        if let Some(data) = self.bounds[bound.index()].take() {
            self.log(UndoOp::BoundDelete(bound, Box::new(data)));
        }
    }

    pub fn meet_bound_domain(&self, bound: MeetBoundId) -> &LSet {
        &self.bound_data(bound).domain
    }

    pub fn meet_bounds(&self, meet: MeetId) -> &[MeetBoundId] {
        &self.meet_data(meet).bounds
    }

    /// Adds `bound` to `meet`. Fails without change when the narrowed
    /// domain would not allow the meet's current assignments.
    pub fn meet_add_meet_bound(&mut self, meet: MeetId, bound: MeetBoundId) -> bool {
        if self.meet_data(meet).bounds.contains(&bound) {
            return true;
        }
        self.meet_data_mut(meet).bounds.push(bound);
        if !self.meet_asst_still_allowed(meet) {
            self.meet_data_mut(meet).bounds.pop();
            return false;
        }
        self.bound_data_mut(bound).meets.push(meet);
        self.log(UndoOp::MeetAddBound(meet, bound));
        let dns = self.meet_subtree_demand(meet);
        self.matching_revise(&dns);
        true
    }

    /// Removes `bound` from `meet`. Widening never invalidates an
    /// assignment, so this always succeeds.
    pub fn meet_delete_meet_bound(&mut self, meet: MeetId, bound: MeetBoundId) {
        let bounds = &mut self.meet_data_mut(meet).bounds;
        let Some(pos) = bounds.iter().position(|b| *b == bound) else {
            return;
        };
        bounds.remove(pos);
        let meets = &mut self.bound_data_mut(bound).meets;
        if let Some(i) = meets.iter().rposition(|m| *m == meet) {
            meets.remove(i);
        }
        self.log(UndoOp::MeetDeleteBound(meet, bound, pos));
        let dns = self.meet_subtree_demand(meet);
        self.matching_revise(&dns);
    }
}
