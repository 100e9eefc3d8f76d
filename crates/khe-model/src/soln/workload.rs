//! Workload requirements: demand nodes that absorb a resource's supply at
//! times it should not be busy.
//!
//! A requirement `(r, num, times)` says `r` may be busy at most `num` of
//! `times`, so `|times| - num` of those (r, t) supply nodes are claimed by
//! workload demand nodes. Requirements for one resource are arranged in a
//! forest by time-set inclusion; a requirement that overlaps another
//! without nesting is dropped. Demand nodes made for a requirement's
//! descendants count towards it.

use khe_core::LSet;

use super::{DemandKind, Soln};
use crate::ids::{ConstraintId, ResourceId};

#[derive(Debug, Clone)]
pub(crate) struct Requirement {
    num: usize,
    times: LSet,
    constraint: ConstraintId,
    children: Vec<Requirement>,
}

fn insert(forest: &mut Vec<Requirement>, mut req: Requirement) -> bool {
    let touching: Vec<usize> = (0..forest.len())
        .filter(|i| !forest[*i].times.is_disjoint(&req.times))
        .collect();
    if touching.iter().all(|i| forest[*i].times.is_subset(&req.times)) {
        for i in touching.into_iter().rev() {
            req.children.push(forest.remove(i));
        }
        req.children.reverse();
        forest.push(req);
        true
    } else if touching.len() == 1 && req.times.is_subset(&forest[touching[0]].times) {
        insert(&mut forest[touching[0]].children, req)
    } else {
        false
    }
}

impl Soln {
    /// Begins the workload requirements of `r`.
    ///
    /// # Panics
    ///
    /// Panics if requirements for another resource are in progress or a
    /// mark is open.
    pub fn matching_begin_workload_requirements(&mut self, r: ResourceId) {
        assert!(
            self.marks.is_empty(),
            "matching_begin_workload_requirements: mark is open"
        );
        assert!(
            self.workload_in_progress.is_none(),
            "matching_begin_workload_requirements: requirements already begun"
        );
        self.workload_in_progress = Some((r, Vec::new()));
    }

    /// Adds the requirement that `r` be busy at most `num` of `times`.
    pub fn matching_add_workload_requirement(
        &mut self,
        r: ResourceId,
        num: usize,
        times: LSet,
        constraint: ConstraintId,
    ) {
        match &mut self.workload_in_progress {
            Some((cur, list)) if *cur == r => list.push(Requirement {
                num,
                times,
                constraint,
                children: Vec::new(),
            }),
            _ => panic!("matching_add_workload_requirement: {} not begun", r),
        }
    }

    /// Ends the requirements of `r`, making their demand nodes.
    pub fn matching_end_workload_requirements(&mut self, r: ResourceId) {
        let list = match self.workload_in_progress.take() {
            Some((cur, list)) if cur == r => list,
            _ => panic!("matching_end_workload_requirements: {} not begun", r),
        };
        let mut forest = Vec::new();
        for req in list {
            if !insert(&mut forest, req) {
                tracing::debug!(resource = %r, "dropped overlapping workload requirement");
            }
        }
        for req in &forest {
            self.make_requirement_nodes(r, req);
        }
        tracing::debug!(
            resource = %r,
            nodes = self.resource_workload_demand_nodes(r).len(),
            cost = %self.cost(),
            "made workload demand nodes"
        );
    }

    /// Makes the nodes of `req`'s subtree in postorder, returning how many
    /// were made.
    fn make_requirement_nodes(&mut self, r: ResourceId, req: &Requirement) -> usize {
        let below: usize = req
            .children
            .iter()
            .map(|c| self.make_requirement_nodes(r, c))
            .sum();
        let wanted = req.times.len().saturating_sub(req.num + below);
        for _ in 0..wanted {
            let dn = self.demand_make(DemandKind::Workload {
                resource: r,
                constraint: req.constraint,
                times: req.times.clone(),
            });
            self.matching.workload_demand.entry(r).or_default().push(dn);
        }
        below + wanted
    }
}
