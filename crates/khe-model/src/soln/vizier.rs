//! Vizier nodes: an extra level between a node and its children.
//!
//! A vizier node has one meet per meet of its parent, of equal duration,
//! assigned at offset 0. The parent's children and child layers move to the
//! vizier, and child meets are reassigned to the corresponding vizier
//! meets. Moving a vizier meet then moves everything assigned to it.

use super::Soln;
use crate::ids::{MeetId, NodeId};

impl Soln {
    /// Inserts a vizier node below `parent` and returns it.
    pub fn node_vizier_make(&mut self, parent: NodeId) -> NodeId {
        let parent_meets = self.node_meets(parent).to_vec();

        // unassign child meets, remembering where they were
        let mut reassign: Vec<(MeetId, usize, usize, bool)> = Vec::new();
        for child in self.node_children(parent).to_vec() {
            for meet in self.node_meets(child).to_vec() {
                if let Some((target, offset)) = self.meet_asst_pair(meet) {
                    if let Some(i) = parent_meets.iter().position(|m| *m == target) {
                        let fixed = self.meet_is_fixed(meet);
                        if fixed {
                            self.meet_assign_unfix(meet);
                        }
                        reassign.push((meet, i, offset, fixed));
                        self.meet_move_unchecked(meet, None);
                    }
                }
            }
        }

        let vizier = self.node_make();
        let mut vizier_meets = Vec::with_capacity(parent_meets.len());
        for pm in &parent_meets {
            let vm = self.meet_make(self.meet_duration(*pm));
            self.node_add_meet(vizier, vm);
            vizier_meets.push(vm);
        }
        let swapped = self.node_swap_child_nodes_and_layers(parent, vizier);
        assert!(swapped, "node_vizier_make: swap failed");
        let added = self.node_add_parent(vizier, parent);
        assert!(added, "node_vizier_make: add parent failed");
        for (vm, pm) in vizier_meets.iter().zip(&parent_meets) {
            let assigned = self.meet_assign(*vm, *pm, 0);
            debug_assert!(assigned, "node_vizier_make: vizier meet assign failed");
        }
        for (meet, i, offset, fixed) in reassign {
            if !self.meet_assign(meet, vizier_meets[i], offset) {
                tracing::debug!(meet = %meet, "vizier reassignment failed");
            } else if fixed {
                self.meet_assign_fix(meet);
            }
        }
        tracing::trace!(parent = %parent, vizier = %vizier, "made vizier node");
        vizier
    }

    /// Removes the vizier node `vizier`, returning its children to its
    /// parent and reassigning child meets to the parent meets the vizier
    /// meets occupy. The parent must have no other children.
    pub fn node_vizier_delete(&mut self, vizier: NodeId) {
        let parent = match self.node_parent(vizier) {
            Some(p) => p,
            None => panic!("node_vizier_delete: {} has no parent", vizier),
        };
        let vizier_meets = self.node_meets(vizier).to_vec();

        let mut reassign: Vec<(MeetId, Option<(MeetId, usize)>, bool)> = Vec::new();
        for child in self.node_children(vizier).to_vec() {
            for meet in self.node_meets(child).to_vec() {
                if let Some((target, offset)) = self.meet_asst_pair(meet) {
                    if vizier_meets.contains(&target) {
                        let new = self
                            .meet_asst_pair(target)
                            .map(|(pm, vo)| (pm, vo + offset));
                        let fixed = self.meet_is_fixed(meet);
                        if fixed {
                            self.meet_assign_unfix(meet);
                        }
                        reassign.push((meet, new, fixed));
                        self.meet_move_unchecked(meet, None);
                    }
                }
            }
        }

        for vm in &vizier_meets {
            if self.meet_asst_pair(*vm).is_some() {
                self.meet_move_unchecked(*vm, None);
            }
            self.meet_delete(*vm);
        }
        let deleted = self.node_delete_parent(vizier);
        assert!(deleted, "node_vizier_delete: delete parent failed");
        let swapped = self.node_swap_child_nodes_and_layers(vizier, parent);
        assert!(swapped, "node_vizier_delete: swap failed");
        self.node_delete(vizier);
        for (meet, target, fixed) in reassign {
            if let Some((pm, offset)) = target {
                if !self.meet_assign(meet, pm, offset) {
                    tracing::debug!(meet = %meet, "vizier reassignment failed");
                } else if fixed {
                    self.meet_assign_fix(meet);
                }
            }
        }
        tracing::trace!(parent = %parent, "deleted vizier node");
    }
}
