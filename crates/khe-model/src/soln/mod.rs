//! The solution: meets, nodes, layers, the demand matching and marks.
//!
//! All solution entities live in arenas indexed by the typed ids of
//! [`crate::ids`]. Deleted entities leave empty slots; ids are never reused,
//! so an id held across a mark is still valid after the mark is undone.
//!
//! Every mutation is recorded in an undo log while a mark is open, and
//! [`Soln::mark_end`] replays the log backwards to restore the exact state
//! at the mark, including the matching.

mod layer;
mod mark;
mod matching;
mod meet;
mod meet_bound;
mod monitor;
mod node;
mod task;
mod vizier;
mod workload;
mod zone;

use std::sync::Arc;

use smallvec::SmallVec;

use khe_core::{Cost, LSet};

use crate::ids::{
    DemandId, EventId, LayerId, MeetBoundGroupId, MeetBoundId, MeetId, NodeId, ResourceId,
    ResourceTypeId, TaskId, TimeId, ZoneId,
};
use crate::instance::Instance;

pub use mark::Mark;
pub(crate) use mark::UndoOp;
pub use matching::DemandKind;
pub(crate) use matching::Matching;
pub use monitor::{MonitorTag, Trace};
pub(crate) use monitor::{GroupMonitorData, TraceState};

#[derive(Debug, Clone)]
pub(crate) struct MeetData {
    pub(crate) duration: usize,
    pub(crate) event: Option<EventId>,
    pub(crate) node: Option<NodeId>,
    pub(crate) asst: Option<(MeetId, usize)>,
    pub(crate) fixed: bool,
    /// Meets assigned to this one, in assignment order.
    pub(crate) assigned: Vec<MeetId>,
    /// Starting times; `None` means automatic.
    pub(crate) domain: Option<LSet>,
    pub(crate) bounds: Vec<MeetBoundId>,
    pub(crate) tasks: SmallVec<[TaskId; 4]>,
    /// Set for cycle meets only.
    pub(crate) cycle_start: Option<TimeId>,
    /// Zone of each offset.
    pub(crate) zones: Vec<Option<ZoneId>>,
}

impl MeetData {
    fn new(duration: usize, event: Option<EventId>, domain: Option<LSet>) -> Self {
        Self {
            duration,
            event,
            node: None,
            asst: None,
            fixed: false,
            assigned: Vec::new(),
            domain,
            bounds: Vec::new(),
            tasks: SmallVec::new(),
            cycle_start: None,
            zones: vec![None; duration],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub(crate) meets: Vec<MeetId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent_layers: Vec<LayerId>,
    pub(crate) child_layers: Vec<LayerId>,
    pub(crate) zones: Vec<ZoneId>,
}

#[derive(Debug, Clone)]
pub(crate) struct LayerData {
    pub(crate) parent: NodeId,
    pub(crate) children: Vec<NodeId>,
    pub(crate) resources: Vec<ResourceId>,
    pub(crate) visit_num: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct TaskData {
    pub(crate) meet: MeetId,
    pub(crate) resource_type: ResourceTypeId,
    pub(crate) preassigned: Option<ResourceId>,
    pub(crate) domain: LSet,
    /// One demand node per offset of the meet.
    pub(crate) demand: SmallVec<[DemandId; 4]>,
}

#[derive(Debug, Clone)]
pub(crate) struct MeetBoundData {
    pub(crate) group: MeetBoundGroupId,
    pub(crate) domain: LSet,
    pub(crate) meets: Vec<MeetId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MeetBoundGroupData {
    pub(crate) bounds: Vec<MeetBoundId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ZoneData {
    pub(crate) node: NodeId,
    pub(crate) meet_offsets: Vec<(MeetId, usize)>,
}

/// A solution of an [`Instance`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use khe_model::{InstanceBuilder, Soln};
///
/// let mut b = InstanceBuilder::new("demo");
/// b.add_times("Mon", 4);
/// let e = b.add_event("Maths", 2, None);
/// let instance = Arc::new(b.build().unwrap());
///
/// let mut soln = Soln::new(instance, 0);
/// soln.make_event_meets();
/// let meet = soln.event_meets(e)[0];
/// let cycle = soln.cycle_meets()[0];
///
/// let mark = soln.mark_begin();
/// assert!(soln.meet_assign(meet, cycle, 1));
/// assert_eq!(soln.meet_asst_time(meet).map(|t| t.index()), Some(1));
/// soln.mark_end(mark, true);
/// assert_eq!(soln.meet_asst(meet), None);
/// ```
#[derive(Debug, Clone)]
pub struct Soln {
    instance: Arc<Instance>,
    diversifier: u32,
    pub(crate) meets: Vec<Option<MeetData>>,
    pub(crate) nodes: Vec<Option<NodeData>>,
    pub(crate) layers: Vec<Option<LayerData>>,
    pub(crate) tasks: Vec<TaskData>,
    pub(crate) bounds: Vec<Option<MeetBoundData>>,
    pub(crate) bound_groups: Vec<Option<MeetBoundGroupData>>,
    pub(crate) zones: Vec<Option<ZoneData>>,
    cycle_node: NodeId,
    cycle_meets: Vec<MeetId>,
    event_meets: Vec<Vec<MeetId>>,
    pub(crate) matching: Matching,
    pub(crate) group_monitors: Vec<GroupMonitorData>,
    pub(crate) trace: Option<TraceState>,
    pub(crate) time_cost: Cost,
    pub(crate) undo_log: Vec<UndoOp>,
    pub(crate) marks: Vec<usize>,
    pub(crate) undoing: bool,
    workload_in_progress: Option<(ResourceId, Vec<workload::Requirement>)>,
}

impl Soln {
    /// Creates a solution with one cycle meet per block of the instance's
    /// times, each lying in the cycle node.
    pub fn new(instance: Arc<Instance>, diversifier: u32) -> Self {
        let supply_count = instance.resource_count() * instance.time_count();
        let event_count = instance.event_count();
        let mut soln = Soln {
            instance,
            diversifier,
            meets: Vec::new(),
            nodes: Vec::new(),
            layers: Vec::new(),
            tasks: Vec::new(),
            bounds: Vec::new(),
            bound_groups: Vec::new(),
            zones: Vec::new(),
            cycle_node: NodeId::new(0),
            cycle_meets: Vec::new(),
            event_meets: vec![Vec::new(); event_count],
            matching: Matching::new(supply_count),
            group_monitors: Vec::new(),
            trace: None,
            time_cost: Cost::ZERO,
            undo_log: Vec::new(),
            marks: Vec::new(),
            undoing: false,
            workload_in_progress: None,
        };
        soln.cycle_node = soln.node_make();
        let blocks = soln.instance.blocks().to_vec();
        for block in blocks {
            let meet = soln.push_meet(MeetData {
                cycle_start: Some(block.start),
                ..MeetData::new(block.len, None, Some(LSet::singleton(block.start.index())))
            });
            soln.cycle_meets.push(meet);
            let added = soln.node_add_meet(soln.cycle_node, meet);
            debug_assert!(added);
        }
        soln
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn diversifier(&self) -> u32 {
        self.diversifier
    }

    pub fn set_diversifier(&mut self, diversifier: u32) {
        self.diversifier = diversifier;
    }

    /// The node holding the cycle meets; the root of the layer tree.
    pub fn cycle_node(&self) -> NodeId {
        self.cycle_node
    }

    /// One cycle meet per block of times, in time order.
    pub fn cycle_meets(&self) -> &[MeetId] {
        &self.cycle_meets
    }

    /// The meets created for `event` by [`make_event_meets`](Self::make_event_meets).
    pub fn event_meets(&self, event: EventId) -> &[MeetId] {
        &self.event_meets[event.index()]
    }

    /// Creates one meet per event, with domain the event's preassigned time
    /// or all times, and one task per event resource.
    ///
    /// # Panics
    ///
    /// Panics if called twice or while a mark is open.
    pub fn make_event_meets(&mut self) {
        assert!(self.marks.is_empty(), "make_event_meets: mark is open");
        assert!(
            self.event_meets.iter().all(Vec::is_empty),
            "make_event_meets: event meets already made"
        );
        let instance = Arc::clone(&self.instance);
        for e in instance.events() {
            let event = instance.event(e);
            let domain = match event.preassigned_time {
                Some(t) => LSet::singleton(t.index()),
                None => instance.all_times(),
            };
            let meet = self.push_meet(MeetData::new(event.duration, Some(e), Some(domain)));
            self.event_meets[e.index()].push(meet);
            for er in &event.resources {
                self.task_make(meet, er.resource_type, er.preassigned, er.domain.clone());
            }
            self.time_cost += self.meet_time_cost(meet);
        }
        tracing::debug!(
            meets = self.meet_count(),
            tasks = self.tasks.len(),
            cost = %self.cost(),
            "made event meets"
        );
    }

    /// Places every event meet in a node of its own, a child of the cycle
    /// node.
    pub fn make_event_nodes(&mut self) -> Vec<NodeId> {
        let mut res = Vec::new();
        for e in 0..self.event_meets.len() {
            let meets = self.event_meets[e].clone();
            if meets.iter().any(|m| self.meet_node(*m).is_some()) {
                continue;
            }
            let node = self.node_make();
            let added = self.node_add_parent(node, self.cycle_node);
            debug_assert!(added);
            for meet in meets {
                self.node_add_meet(node, meet);
            }
            res.push(node);
        }
        res
    }

    /// The total cost: unmatched demand plus time costs.
    pub fn cost(&self) -> Cost {
        self.matching_cost() + self.time_cost
    }

    /// The cost of assign-time and prefer-times constraints.
    pub fn time_cost(&self) -> Cost {
        self.time_cost
    }

    pub(crate) fn meet_data(&self, meet: MeetId) -> &MeetData {
        match &self.meets[meet.index()] {
            Some(m) => m,
            None => panic!("{} has been deleted", meet),
        }
    }

    pub(crate) fn meet_data_mut(&mut self, meet: MeetId) -> &mut MeetData {
        match &mut self.meets[meet.index()] {
            Some(m) => m,
            None => panic!("{} has been deleted", meet),
        }
    }

    pub(crate) fn node_data(&self, node: NodeId) -> &NodeData {
        match &self.nodes[node.index()] {
            Some(n) => n,
            None => panic!("{} has been deleted", node),
        }
    }

    pub(crate) fn node_data_mut(&mut self, node: NodeId) -> &mut NodeData {
        match &mut self.nodes[node.index()] {
            Some(n) => n,
            None => panic!("{} has been deleted", node),
        }
    }

    pub(crate) fn layer_data(&self, layer: LayerId) -> &LayerData {
        match &self.layers[layer.index()] {
            Some(l) => l,
            None => panic!("{} has been deleted", layer),
        }
    }

    pub(crate) fn layer_data_mut(&mut self, layer: LayerId) -> &mut LayerData {
        match &mut self.layers[layer.index()] {
            Some(l) => l,
            None => panic!("{} has been deleted", layer),
        }
    }

    pub(crate) fn push_meet(&mut self, data: MeetData) -> MeetId {
        self.meets.push(Some(data));
        let meet = MeetId::new(self.meets.len() - 1);
        self.log(UndoOp::MeetMake(meet));
        meet
    }

    /// Records `op` when a mark is open.
    pub(crate) fn log(&mut self, op: UndoOp) {
        if !self.marks.is_empty() && !self.undoing {
            self.undo_log.push(op);
        }
    }
}

#[cfg(test)]
mod tests;
