//! The demand matching.
//!
//! Supply nodes are (resource, time) pairs, indexed `r * T + t`. Demand
//! nodes are either one offset of a task, which may be matched to any
//! resource of the task's domain at the time that offset occupies, or one
//! unit of a workload requirement, which absorbs a (resource, time) pair the
//! resource should not be busy at. Every unmatched demand node costs the
//! matching weight.
//!
//! The matching is kept maximum: whenever domains change, pairs that are no
//! longer legal are broken and one augmenting-path search is made from each
//! unmatched demand node.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use khe_core::{Cost, LSet};
use smallvec::SmallVec;

use super::{Soln, UndoOp};
use crate::ids::{ConstraintId, DemandId, GroupMonitorId, ResourceId, TaskId, TimeId};

/// What a demand node demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemandKind {
    /// Offset `offset` of `task`.
    Ordinary { task: TaskId, offset: usize },
    /// One unit of a workload requirement of `resource` over `times`,
    /// derived from `constraint`.
    Workload {
        resource: ResourceId,
        constraint: ConstraintId,
        times: LSet,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct DemandNode {
    pub(crate) kind: DemandKind,
    pub(crate) asst: Option<usize>,
    pub(crate) groups: SmallVec<[GroupMonitorId; 2]>,
}

#[derive(Debug, Clone)]
pub(crate) struct Matching {
    weight: Cost,
    pub(crate) demand: Vec<DemandNode>,
    supply_owner: Vec<Option<DemandId>>,
    unmatched: BTreeSet<DemandId>,
    pub(crate) workload_demand: BTreeMap<ResourceId, Vec<DemandId>>,
    /// Supply nodes stamped with `epoch` were visited by the current search.
    visited: Vec<u32>,
    epoch: u32,
}

/// One demand node on the path of an augmenting search.
struct SearchFrame {
    dn: DemandId,
    domain: Vec<usize>,
    next: usize,
}

impl Matching {
    pub(crate) fn new(supply_count: usize) -> Self {
        Self {
            weight: Cost::ONE_HARD,
            demand: Vec::new(),
            supply_owner: vec![None; supply_count],
            unmatched: BTreeSet::new(),
            workload_demand: BTreeMap::new(),
            visited: vec![0; supply_count],
            epoch: 0,
        }
    }
}

impl Soln {
    pub(crate) fn demand_make(&mut self, kind: DemandKind) -> DemandId {
        let dn = DemandId::new(self.matching.demand.len());
        self.matching.demand.push(DemandNode {
            kind,
            asst: None,
            groups: SmallVec::new(),
        });
        self.matching.unmatched.insert(dn);
        self.augment(dn);
        dn
    }

    /// The cost of one unmatched demand node.
    pub fn matching_weight(&self) -> Cost {
        self.matching.weight
    }

    pub fn matching_set_weight(&mut self, weight: Cost) {
        self.matching.weight = weight;
    }

    /// Total cost of unmatched demand nodes.
    pub fn matching_cost(&self) -> Cost {
        self.matching.weight * self.matching.unmatched.len() as i64
    }

    pub fn matching_unmatched_count(&self) -> usize {
        self.matching.unmatched.len()
    }

    /// Unmatched demand nodes in increasing id order.
    pub fn matching_unmatched(&self) -> impl Iterator<Item = DemandId> + '_ {
        self.matching.unmatched.iter().copied()
    }

    pub fn demand_count(&self) -> usize {
        self.matching.demand.len()
    }

    pub fn demand_kind(&self, dn: DemandId) -> &DemandKind {
        &self.matching.demand[dn.index()].kind
    }

    /// The task of an ordinary demand node.
    pub fn demand_task(&self, dn: DemandId) -> Option<TaskId> {
        match self.matching.demand[dn.index()].kind {
            DemandKind::Ordinary { task, .. } => Some(task),
            DemandKind::Workload { .. } => None,
        }
    }

    /// The group monitors `dn` belongs to.
    pub fn demand_groups(&self, dn: DemandId) -> &[GroupMonitorId] {
        &self.matching.demand[dn.index()].groups
    }

    pub fn demand_is_matched(&self, dn: DemandId) -> bool {
        self.matching.demand[dn.index()].asst.is_some()
    }

    /// The (resource, time) supply `dn` is matched to.
    pub fn demand_asst(&self, dn: DemandId) -> Option<(ResourceId, TimeId)> {
        let t_count = self.instance().time_count();
        self.matching.demand[dn.index()]
            .asst
            .map(|s| (ResourceId::new(s / t_count), TimeId::new(s % t_count)))
    }

    /// The matching weight when `dn` is unmatched, else zero.
    pub fn demand_cost(&self, dn: DemandId) -> Cost {
        if self.demand_is_matched(dn) {
            Cost::ZERO
        } else {
            self.matching.weight
        }
    }

    /// The supply indexes `dn` may be matched to.
    pub(crate) fn demand_domain(&self, dn: DemandId) -> Vec<usize> {
        let t_count = self.instance().time_count();
        match &self.matching.demand[dn.index()].kind {
            DemandKind::Ordinary { task, offset } => {
                let task = &self.tasks[task.index()];
                let times = self
                    .meet_start_domain(task.meet)
                    .shift(*offset as isize, t_count);
                let resources: Vec<usize> = match task.preassigned {
                    Some(r) => vec![r.index()],
                    None => task.domain.iter().collect(),
                };
                resources
                    .iter()
                    .flat_map(|r| times.iter().map(move |t| r * t_count + t))
                    .collect()
            }
            DemandKind::Workload {
                resource, times, ..
            } => times
                .iter()
                .map(|t| resource.index() * t_count + t)
                .collect(),
        }
    }

    /// Every (resource, time) pair `dn` may be matched to.
    pub fn demand_domain_pairs(&self, dn: DemandId) -> Vec<(ResourceId, TimeId)> {
        let t_count = self.instance().time_count();
        self.demand_domain(dn)
            .into_iter()
            .map(|s| (ResourceId::new(s / t_count), TimeId::new(s % t_count)))
            .collect()
    }

    /// Sets the supply of `dn`, keeping costs, traces and the undo log
    /// in step.
    pub(crate) fn demand_set_asst(&mut self, dn: DemandId, asst: Option<usize>) {
        let prev = self.matching.demand[dn.index()].asst;
        if prev == asst {
            return;
        }
        if !self.undoing {
            self.trace_notify(dn);
        }
        if let Some(s) = prev {
            if self.matching.supply_owner[s] == Some(dn) {
                self.matching.supply_owner[s] = None;
            }
        }
        if let Some(s) = asst {
            self.matching.supply_owner[s] = Some(dn);
        }
        self.matching.demand[dn.index()].asst = asst;
        match asst {
            Some(_) => self.matching.unmatched.remove(&dn),
            None => self.matching.unmatched.insert(dn),
        };
        self.log(UndoOp::DemandAsst { dn, prev });
    }

    /// Breaks the pairs of `dns` that have become illegal, then restores a
    /// maximum matching.
    pub(crate) fn matching_revise(&mut self, dns: &[DemandId]) {
        for dn in dns {
            if let Some(s) = self.matching.demand[dn.index()].asst {
                if !self.demand_domain(*dn).contains(&s) {
                    self.demand_set_asst(*dn, None);
                }
            }
        }
        let unmatched: Vec<DemandId> = self.matching.unmatched.iter().copied().collect();
        for dn in unmatched {
            self.augment(dn);
        }
    }

    /// Starts a new search, forgetting which supply nodes were visited.
    fn search_begin(&mut self) -> u32 {
        let m = &mut self.matching;
        m.epoch = m.epoch.wrapping_add(1);
        if m.epoch == 0 {
            m.visited.fill(0);
            m.epoch = 1;
        }
        m.epoch
    }

    /// Searches depth-first for an augmenting path from the unmatched `dn`
    /// and flips it when found. Each supply node is tried at most once.
    fn augment(&mut self, dn: DemandId) -> bool {
        if self.demand_is_matched(dn) {
            return true;
        }
        let epoch = self.search_begin();
        let mut path = vec![SearchFrame {
            dn,
            domain: self.demand_domain(dn),
            next: 0,
        }];
        loop {
            let Some(top) = path.last_mut() else {
                return false;
            };
            let Some(&s) = top.domain.get(top.next) else {
                path.pop();
                continue;
            };
            top.next += 1;
            if self.matching.visited[s] == epoch {
                continue;
            }
            self.matching.visited[s] = epoch;
            match self.matching.supply_owner[s] {
                Some(owner) => path.push(SearchFrame {
                    dn: owner,
                    domain: self.demand_domain(owner),
                    next: 0,
                }),
                None => {
                    // each frame takes the supply it last tried, deepest first
                    for frame in path.iter().rev() {
                        self.demand_set_asst(frame.dn, Some(frame.domain[frame.next - 1]));
                    }
                    return true;
                }
            }
        }
    }

    /// `dn` followed by every demand node competing with it, directly or
    /// indirectly, for supply: a breadth-first search alternating between
    /// domains and the current owners of their supply nodes.
    pub fn demand_competitors(&self, dn: DemandId) -> Vec<DemandId> {
        let mut seen = BTreeSet::from([dn]);
        let mut res = vec![dn];
        let mut queue = VecDeque::from([dn]);
        while let Some(x) = queue.pop_front() {
            for s in self.demand_domain(x) {
                if let Some(owner) = self.matching.supply_owner[s] {
                    if seen.insert(owner) {
                        res.push(owner);
                        queue.push_back(owner);
                    }
                }
            }
        }
        res
    }

    /// The workload demand nodes made for `r`.
    pub fn resource_workload_demand_nodes(&self, r: ResourceId) -> &[DemandId] {
        self.matching
            .workload_demand
            .get(&r)
            .map_or(&[], Vec::as_slice)
    }
}
