//! Tasks: the resource requirements of meets.

use khe_core::LSet;
use smallvec::SmallVec;

use super::{DemandKind, Soln, TaskData};
use crate::ids::{DemandId, MeetId, ResourceId, ResourceTypeId, TaskId};

impl Soln {
    /// Creates a task of `meet` with one ordinary demand node per offset.
    pub(crate) fn task_make(
        &mut self,
        meet: MeetId,
        resource_type: ResourceTypeId,
        preassigned: Option<ResourceId>,
        domain: LSet,
    ) -> TaskId {
        assert!(self.marks.is_empty(), "task_make: mark is open");
        let task = TaskId::new(self.tasks.len());
        self.tasks.push(TaskData {
            meet,
            resource_type,
            preassigned,
            domain,
            demand: SmallVec::new(),
        });
        self.meet_data_mut(meet).tasks.push(task);
        for offset in 0..self.meet_data(meet).duration {
            let dn = self.demand_make(DemandKind::Ordinary { task, offset });
            self.tasks[task.index()].demand.push(dn);
        }
        task
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.tasks.len()).map(TaskId::new)
    }

    pub fn task_meet(&self, task: TaskId) -> MeetId {
        self.tasks[task.index()].meet
    }

    pub fn task_resource_type(&self, task: TaskId) -> ResourceTypeId {
        self.tasks[task.index()].resource_type
    }

    /// The resource preassigned to `task`, if any.
    pub fn task_preassigned(&self, task: TaskId) -> Option<ResourceId> {
        self.tasks[task.index()].preassigned
    }

    pub fn task_domain(&self, task: TaskId) -> &LSet {
        &self.tasks[task.index()].domain
    }

    /// The demand nodes of `task`, one per offset of its meet.
    pub fn task_demand_nodes(&self, task: TaskId) -> &[DemandId] {
        &self.tasks[task.index()].demand
    }

    /// True when some task of `meet` or of a meet assigned to it, directly
    /// or not, has a preassigned resource.
    pub fn meet_contains_preassigned_task(&self, meet: MeetId) -> bool {
        self.meet_subtree(meet).iter().any(|m| {
            self.meet_data(*m)
                .tasks
                .iter()
                .any(|t| self.tasks[t.index()].preassigned.is_some())
        })
    }

    /// A preassigned task of `meet` or of a meet assigned to it.
    pub fn meet_find_preassigned_task(&self, meet: MeetId) -> Option<TaskId> {
        self.meet_subtree(meet).iter().find_map(|m| {
            self.meet_data(*m)
                .tasks
                .iter()
                .copied()
                .find(|t| self.tasks[t.index()].preassigned.is_some())
        })
    }
}
