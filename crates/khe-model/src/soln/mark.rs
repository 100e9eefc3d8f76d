//! Marks: nested checkpoints that commit or exactly undo later changes.

use khe_core::{Cost, LSet};

use super::{LayerData, MeetBoundData, MeetBoundGroupData, MeetData, NodeData, Soln, ZoneData};
use crate::ids::{
    DemandId, GroupMonitorId, LayerId, MeetBoundGroupId, MeetBoundId, MeetId, NodeId, ResourceId,
    ZoneId,
};

/// A checkpoint returned by [`Soln::mark_begin`].
///
/// Marks nest strictly: a mark must be ended before any mark begun before
/// it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a mark must be passed to mark_end"]
pub struct Mark {
    depth: usize,
    log_len: usize,
    cost: Cost,
}

impl Mark {
    /// The solution cost when the mark began.
    pub fn cost(&self) -> Cost {
        self.cost
    }
}

/// The inverse of one primitive mutation.
#[derive(Debug, Clone)]
pub(crate) enum UndoOp {
    MeetMake(MeetId),
    MeetDelete(MeetId, Box<MeetData>),
    MeetMove {
        meet: MeetId,
        prev: Option<(MeetId, usize)>,
    },
    MeetSetFixed {
        meet: MeetId,
        prev: bool,
    },
    MeetSetDomain {
        meet: MeetId,
        prev: Option<LSet>,
    },
    MeetAddBound(MeetId, MeetBoundId),
    MeetDeleteBound(MeetId, MeetBoundId, usize),
    NodeMake(NodeId),
    NodeDelete(NodeId, Box<NodeData>),
    NodeAddMeet(NodeId, MeetId),
    NodeDeleteMeet(NodeId, MeetId, usize),
    NodeAddParent(NodeId),
    NodeDeleteParent(NodeId, NodeId, usize),
    NodeSwapChildren(NodeId, NodeId),
    NodeSetChildLayers(NodeId, Vec<LayerId>),
    LayerMake(LayerId),
    LayerDelete(LayerId, Box<LayerData>, usize),
    LayerAddChild(LayerId, NodeId),
    LayerDeleteChild(LayerId, NodeId, usize),
    LayerAddResource(LayerId, ResourceId),
    LayerSetVisitNum(LayerId, usize),
    BoundGroupMake(MeetBoundGroupId),
    BoundGroupDelete(MeetBoundGroupId, Box<MeetBoundGroupData>),
    BoundMake(MeetBoundId),
    BoundDelete(MeetBoundId, Box<MeetBoundData>),
    ZoneMake(ZoneId),
    ZoneDelete(ZoneId, Box<ZoneData>, usize),
    ZoneAddMeetOffset(ZoneId, MeetId, usize),
    ZoneDeleteMeetOffset(ZoneId, MeetId, usize, usize),
    DemandAsst {
        dn: DemandId,
        prev: Option<usize>,
    },
    GroupMonitorAddDemand(GroupMonitorId, DemandId),
}

fn remove_item<T: PartialEq + Copy + std::fmt::Debug>(list: &mut Vec<T>, item: T) {
    match list.iter().rposition(|x| *x == item) {
        Some(pos) => {
            list.remove(pos);
        }
        None => panic!("undo: {:?} missing from {:?}", item, list),
    }
}

impl Soln {
    /// Begins a mark at the current state.
    pub fn mark_begin(&mut self) -> Mark {
        self.marks.push(self.undo_log.len());
        Mark {
            depth: self.marks.len() - 1,
            log_len: self.undo_log.len(),
            cost: self.cost(),
        }
    }

    /// Ends `mark`, first undoing every change since it began when `undo`
    /// is true.
    ///
    /// # Panics
    ///
    /// Panics if `mark` is not the most recently begun open mark.
    pub fn mark_end(&mut self, mark: Mark, undo: bool) {
        assert_eq!(
            mark.depth + 1,
            self.marks.len(),
            "mark_end: marks must end in reverse order of beginning"
        );
        if undo {
            self.undo_to(mark.log_len);
            debug_assert_eq!(self.cost(), mark.cost, "mark_end: cost not restored");
        }
        self.marks.pop();
        if self.marks.is_empty() {
            self.undo_log.clear();
        }
    }

    /// Undoes every change since `mark` began, leaving it open.
    pub fn mark_undo(&mut self, mark: &Mark) {
        assert_eq!(
            mark.depth + 1,
            self.marks.len(),
            "mark_undo: mark is not the innermost open mark"
        );
        self.undo_to(mark.log_len);
        debug_assert_eq!(self.cost(), mark.cost, "mark_undo: cost not restored");
    }

    /// Runs `f` under a fresh mark, keeping its changes only when it
    /// returns true.
    pub fn with_mark(&mut self, f: impl FnOnce(&mut Soln) -> bool) -> bool {
        let mark = self.mark_begin();
        let success = f(self);
        self.mark_end(mark, !success);
        success
    }

    /// True when at least one mark is open.
    pub fn mark_is_open(&self) -> bool {
        !self.marks.is_empty()
    }

    fn undo_to(&mut self, log_len: usize) {
        self.undoing = true;
        while self.undo_log.len() > log_len {
            if let Some(op) = self.undo_log.pop() {
                self.apply_undo(op);
            }
        }
        self.undoing = false;
    }

    fn apply_undo(&mut self, op: UndoOp) {
        match op {
            UndoOp::MeetMake(meet) => {
                debug_assert!(self.meet_data(meet).assigned.is_empty());
                self.meets[meet.index()] = None;
            }
            UndoOp::MeetDelete(meet, data) => {
                self.meets[meet.index()] = Some(*data);
            }
            UndoOp::MeetMove { meet, prev } => {
                let before = self.subtree_time_cost(meet);
                self.raw_meet_move(meet, prev);
                self.time_cost += self.subtree_time_cost(meet) - before;
            }
            UndoOp::MeetSetFixed { meet, prev } => {
                self.meet_data_mut(meet).fixed = prev;
            }
            UndoOp::MeetSetDomain { meet, prev } => {
                self.meet_data_mut(meet).domain = prev;
            }
            UndoOp::MeetAddBound(meet, bound) => {
                remove_item(&mut self.meet_data_mut(meet).bounds, bound);
                remove_item(&mut self.bound_data_mut(bound).meets, meet);
            }
            UndoOp::MeetDeleteBound(meet, bound, pos) => {
                self.meet_data_mut(meet).bounds.insert(pos, bound);
                self.bound_data_mut(bound).meets.push(meet);
            }
            UndoOp::NodeMake(node) => {
                self.nodes[node.index()] = None;
            }
            UndoOp::NodeDelete(node, data) => {
                self.nodes[node.index()] = Some(*data);
            }
            UndoOp::NodeAddMeet(node, meet) => {
                remove_item(&mut self.node_data_mut(node).meets, meet);
                self.meet_data_mut(meet).node = None;
            }
            UndoOp::NodeDeleteMeet(node, meet, pos) => {
                self.node_data_mut(node).meets.insert(pos, meet);
                self.meet_data_mut(meet).node = Some(node);
            }
            UndoOp::NodeAddParent(child) => {
                if let Some(parent) = self.node_data_mut(child).parent.take() {
                    remove_item(&mut self.node_data_mut(parent).children, child);
                }
            }
            UndoOp::NodeDeleteParent(child, parent, pos) => {
                self.node_data_mut(parent).children.insert(pos, child);
                self.node_data_mut(child).parent = Some(parent);
            }
            UndoOp::NodeSwapChildren(a, b) => {
                self.raw_node_swap_children(a, b);
            }
            UndoOp::NodeSetChildLayers(node, prev) => {
                self.node_data_mut(node).child_layers = prev;
            }
            UndoOp::LayerMake(layer) => {
                let parent = self.layer_data(layer).parent;
                remove_item(&mut self.node_data_mut(parent).child_layers, layer);
                self.layers[layer.index()] = None;
            }
            UndoOp::LayerDelete(layer, data, pos) => {
                let parent = data.parent;
                self.layers[layer.index()] = Some(*data);
                self.node_data_mut(parent).child_layers.insert(pos, layer);
            }
            UndoOp::LayerAddChild(layer, node) => {
                remove_item(&mut self.layer_data_mut(layer).children, node);
                remove_item(&mut self.node_data_mut(node).parent_layers, layer);
            }
            UndoOp::LayerDeleteChild(layer, node, pos) => {
                self.layer_data_mut(layer).children.insert(pos, node);
                self.node_data_mut(node).parent_layers.push(layer);
            }
            UndoOp::LayerAddResource(layer, r) => {
                remove_item(&mut self.layer_data_mut(layer).resources, r);
            }
            UndoOp::LayerSetVisitNum(layer, prev) => {
                self.layer_data_mut(layer).visit_num = prev;
            }
            UndoOp::BoundGroupMake(group) => {
                self.bound_groups[group.index()] = None;
            }
            UndoOp::BoundGroupDelete(group, data) => {
                self.bound_groups[group.index()] = Some(*data);
            }
            UndoOp::BoundMake(bound) => {
                let group = self.bound_data(bound).group;
                remove_item(&mut self.bound_group_data_mut(group).bounds, bound);
                self.bounds[bound.index()] = None;
            }
            UndoOp::BoundDelete(bound, data) => {
                let group = data.group;
                self.bounds[bound.index()] = Some(*data);
                self.bound_group_data_mut(group).bounds.push(bound);
            }
            UndoOp::ZoneMake(zone) => {
                let node = self.zone_data(zone).node;
                remove_item(&mut self.node_data_mut(node).zones, zone);
                self.zones[zone.index()] = None;
            }
            UndoOp::ZoneDelete(zone, data, pos) => {
                let node = data.node;
                self.zones[zone.index()] = Some(*data);
                self.node_data_mut(node).zones.insert(pos, zone);
            }
            UndoOp::ZoneAddMeetOffset(zone, meet, offset) => {
                remove_item(&mut self.zone_data_mut(zone).meet_offsets, (meet, offset));
                self.meet_data_mut(meet).zones[offset] = None;
            }
            UndoOp::ZoneDeleteMeetOffset(zone, meet, offset, pos) => {
                self.zone_data_mut(zone).meet_offsets.insert(pos, (meet, offset));
                self.meet_data_mut(meet).zones[offset] = Some(zone);
            }
            UndoOp::DemandAsst { dn, prev } => {
                self.demand_set_asst(dn, prev);
            }
            UndoOp::GroupMonitorAddDemand(group, dn) => {
                let groups = &mut self.matching.demand[dn.index()].groups;
                match groups.iter().rposition(|g| *g == group) {
                    Some(pos) => {
                        groups.remove(pos);
                    }
                    None => panic!("undo: {:?} missing from groups of {:?}", group, dn),
                }
                remove_item(&mut self.group_monitors[group.index()].members, dn);
            }
        }
    }
}
