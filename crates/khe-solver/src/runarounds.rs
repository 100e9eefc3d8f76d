//! Runaround construction.
//!
//! A runaround is a set of child nodes that share resources and are too
//! tight to timetable on their own: their minimum runaround duration (the
//! smallest total duration of parent meets that admits a cost-neutral
//! assignment of their children) exceeds their own duration. Merging such
//! nodes under a fresh root node of the right shape, and timetabling that
//! root, lets them rotate through a common set of meets.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use khe_config::SolveOptions;
use khe_model::{MeetId, NodeId, ResourceId, Soln};
use tracing::{debug, trace};

use crate::basic::node_unassign_times;
use crate::time_solver::TimeSolver;

/// Makes an unassigned meet with the duration, meet bounds and effective
/// domain of `src`.
fn meet_copy(soln: &mut Soln, src: MeetId) -> MeetId {
    let copy = soln.meet_make(soln.meet_duration(src));
    for bound in soln.meet_bounds(src).to_vec() {
        let added = soln.meet_add_meet_bound(copy, bound);
        debug_assert!(added, "meet_copy: bound rejected by an unassigned meet");
    }
    let domain = soln.meet_domain(src);
    if soln.meet_domain(copy) != domain {
        let set = soln.meet_set_domain(copy, domain);
        debug_assert!(set, "meet_copy: domain rejected by an unassigned meet");
    }
    copy
}

/// Unassigns the children of `node` and deletes the meets of `node` beyond
/// the first `count`.
fn reset_node(soln: &mut Soln, node: NodeId, count: usize) {
    node_unassign_times(soln, node);
    while soln.node_meet_count(node) > count {
        let last = soln.node_meets(node)[soln.node_meet_count(node) - 1];
        soln.meet_delete(last);
    }
}

/// The smallest total duration of meets of `node` under which `solver`
/// assigns the children of `node` without raising the solution cost.
///
/// Starting from the meets `node` has, each failed attempt adds a copy of
/// every original meet, up to one more attempt than `node` has children.
/// The node's children end unassigned and its meets are restored either
/// way. Returns `None` when no attempt succeeds.
pub fn minimum_runaround_duration(
    soln: &mut Soln,
    node: NodeId,
    solver: &dyn TimeSolver,
    options: &SolveOptions,
) -> Option<usize> {
    node_unassign_times(soln, node);
    let init_count = soln.node_meet_count(node);
    let init_cost = soln.cost();
    let originals = soln.node_meets(node).to_vec();
    let mut res = None;
    for _ in 0..=soln.node_child_count(node) {
        if solver.solve(soln, node, options) && soln.cost() <= init_cost {
            res = Some(soln.node_duration(node));
            break;
        }
        node_unassign_times(soln, node);
        for meet in &originals {
            let copy = meet_copy(soln, *meet);
            let added = soln.node_add_meet(node, copy);
            debug_assert!(added);
        }
    }
    reset_node(soln, node, init_count);
    trace!(%node, mrd = ?res, "minimum runaround duration");
    res
}

/// The shape of a node: its meets in decreasing duration order, and how
/// many nodes of a [`NodeTemplateSet`] share the shape.
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    frequency: usize,
    duration: usize,
    meets: Vec<MeetId>,
}

impl NodeTemplate {
    /// The template of the meets of `nodes` together.
    pub fn from_nodes(soln: &Soln, nodes: &[NodeId]) -> Self {
        let mut meets: Vec<MeetId> = nodes
            .iter()
            .flat_map(|n| soln.node_meets(*n).iter().copied())
            .collect();
        meets.sort_by_key(|m| Reverse(soln.meet_duration(*m)));
        Self {
            frequency: 1,
            duration: meets.iter().map(|m| soln.meet_duration(*m)).sum(),
            meets,
        }
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn duration(&self) -> usize {
        self.duration
    }

    pub fn meets(&self) -> &[MeetId] {
        &self.meets
    }

    /// Same number of meets, with pairwise equal durations and domains.
    pub fn same_shape(&self, soln: &Soln, other: &NodeTemplate) -> bool {
        self.meets.len() == other.meets.len()
            && self.meets.iter().zip(&other.meets).all(|(a, b)| {
                soln.meet_duration(*a) == soln.meet_duration(*b)
                    && soln.meet_domain(*a) == soln.meet_domain(*b)
            })
    }

    /// Makes a parentless node whose meets copy this template's meets.
    pub fn make_node(&self, soln: &mut Soln) -> NodeId {
        let node = soln.node_make();
        for meet in &self.meets {
            let copy = meet_copy(soln, *meet);
            let added = soln.node_add_meet(node, copy);
            debug_assert!(added);
        }
        node
    }
}

/// Distinct node templates, bucketed by total duration, most frequent
/// first within each bucket.
#[derive(Debug, Clone, Default)]
pub struct NodeTemplateSet {
    buckets: BTreeMap<usize, Vec<NodeTemplate>>,
}

impl NodeTemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The templates of the child nodes of `parent`.
    pub fn of_children(soln: &Soln, parent: NodeId) -> Self {
        let mut set = Self::new();
        for child in soln.node_children(parent) {
            set.add(soln, NodeTemplate::from_nodes(soln, &[*child]));
        }
        set
    }

    /// Adds `template`, or bumps the frequency of an equal template and
    /// moves it ahead of any less frequent ones.
    pub fn add(&mut self, soln: &Soln, template: NodeTemplate) {
        let bucket = self.buckets.entry(template.duration).or_default();
        match bucket.iter().position(|t| t.same_shape(soln, &template)) {
            Some(mut i) => {
                bucket[i].frequency += 1;
                while i > 0 && bucket[i - 1].frequency < bucket[i].frequency {
                    bucket.swap(i - 1, i);
                    i -= 1;
                }
            }
            None => bucket.push(template),
        }
    }

    pub fn templates_of_duration(&self, duration: usize) -> &[NodeTemplate] {
        self.buckets.get(&duration).map_or(&[], Vec::as_slice)
    }

    pub fn template_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// The duration maximizing the number of nodes of that duration times
    /// the duration, whatever their shapes; the shortest such on ties. Zero
    /// when the set is empty.
    pub fn most_popular_duration(&self) -> usize {
        let mut best = (0, 0);
        for (duration, bucket) in &self.buckets {
            let frequency: usize = bucket.iter().map(|t| t.frequency).sum();
            let score = frequency * duration;
            if score > best.0 {
                best = (score, *duration);
            }
        }
        best.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunaroundNode {
    node: NodeId,
    duration: usize,
    mrd: usize,
    problem: bool,
    resources: Vec<ResourceId>,
}

/// Free nodes first, by decreasing duration; then problem nodes by
/// increasing minimum runaround duration. Popping from the end therefore
/// takes the hardest problem node first.
fn merge_cmp(a: &RunaroundNode, b: &RunaroundNode) -> Ordering {
    match (a.problem, b.problem) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => a.mrd.cmp(&b.mrd).then(a.node.cmp(&b.node)),
        (false, false) => b.duration.cmp(&a.duration).then(a.node.cmp(&b.node)),
    }
}

struct Builder<'a> {
    parent: NodeId,
    templates: &'a NodeTemplateSet,
    u: usize,
    v: usize,
    solver: &'a dyn TimeSolver,
    options: &'a SolveOptions,
    made: usize,
}

impl Builder<'_> {
    /// Tries to timetable `nodes` as one runaround under a root node made
    /// from `template`, or from all their meets when there is none.
    fn try_runaround(
        &mut self,
        soln: &mut Soln,
        nodes: &[NodeId],
        template: Option<&NodeTemplate>,
    ) -> bool {
        let mark = soln.mark_begin();
        let root = match template {
            Some(t) => t.make_node(soln),
            None => NodeTemplate::from_nodes(soln, nodes).make_node(soln),
        };
        for node in nodes {
            for child in soln.node_children(*node).to_vec() {
                let moved = soln.node_move(child, root);
                assert!(moved, "try_runaround: cannot move {} under root", child);
            }
            let moved = soln.node_move(*node, root);
            assert!(moved, "try_runaround: cannot move {} under root", node);
        }
        let cost_before = soln.cost();
        let success =
            self.solver.solve(soln, root, self.options) && soln.cost() <= cost_before;
        soln.mark_end(mark, !success);
        if success {
            node_unassign_times(soln, root);
            let added = soln.node_add_parent(root, self.parent);
            assert!(added, "try_runaround: cannot add root to {}", self.parent);
            self.made += 1;
            debug!(%root, nodes = ?nodes, "made runaround");
        }
        success
    }

    /// Tries every template of duration `duration`, most frequent first,
    /// and then an ad hoc root.
    fn try_runarounds(&mut self, soln: &mut Soln, nodes: &[NodeId], duration: usize) -> bool {
        let templates: &NodeTemplateSet = self.templates;
        for template in templates.templates_of_duration(duration) {
            if self.try_runaround(soln, nodes, Some(template)) {
                return true;
            }
        }
        self.try_runaround(soln, nodes, None)
    }

    fn handle_mergeable_set(&mut self, soln: &mut Soln, mut set: Vec<RunaroundNode>) {
        set.sort_by(merge_cmp);
        while let Some(n) = set.pop() {
            if !n.problem || n.mrd >= self.v {
                continue;
            }

            // pairs whose combined duration is the most popular one
            let mut merged = false;
            for j in (0..set.len()).rev() {
                let d = n.duration + set[j].duration;
                if n.mrd <= d
                    && d == self.u
                    && d <= self.v
                    && self.try_runarounds(soln, &[n.node, set[j].node], d)
                {
                    set.remove(j);
                    merged = true;
                    break;
                }
            }
            if merged {
                continue;
            }

            // grow from the end while the duration stays within bounds
            let mut d = n.duration;
            let mut chosen: Vec<usize> = Vec::new();
            for j in (0..set.len()).rev() {
                d += set[j].duration;
                if d > self.v {
                    break;
                }
                chosen.push(j);
                if d >= n.mrd {
                    let nodes: Vec<NodeId> = std::iter::once(n.node)
                        .chain(chosen.iter().map(|k| set[*k].node))
                        .collect();
                    if self.try_runarounds(soln, &nodes, d) {
                        for k in &chosen {
                            set.remove(*k);
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Merges child nodes of `parent` into runarounds.
///
/// Children of `parent` are unassigned first. `mrd_solver` measures
/// minimum runaround durations and `runaround_solver` timetables each
/// candidate runaround; a candidate is kept only when that succeeds
/// without raising the solution cost, and is otherwise undone exactly.
/// Kept runarounds are left unassigned as new children of `parent`.
/// Returns the number of runarounds made.
pub fn build_runarounds(
    soln: &mut Soln,
    parent: NodeId,
    mrd_solver: &dyn TimeSolver,
    runaround_solver: &dyn TimeSolver,
    options: &SolveOptions,
) -> usize {
    node_unassign_times(soln, parent);
    let templates = NodeTemplateSet::of_children(soln, parent);
    let parent_duration = soln.node_duration(parent);
    let u = templates.most_popular_duration();
    let v = parent_duration / 5;

    let mut nodes: Vec<RunaroundNode> = Vec::new();
    for child in soln.node_children(parent).to_vec() {
        if soln.node_child_count(child) == 0 {
            continue;
        }
        let Some(mrd) = minimum_runaround_duration(soln, child, mrd_solver, options) else {
            continue;
        };
        if mrd <= v {
            let duration = soln.node_duration(child);
            nodes.push(RunaroundNode {
                node: child,
                duration,
                mrd,
                problem: mrd > duration,
                resources: Vec::new(),
            });
        }
    }

    let instance = soln.instance().clone();
    for r in instance.resources() {
        if instance.resource_layer_duration(r) * 10 < parent_duration * 9 {
            continue;
        }
        let layer = soln.layer_make_from_resource(parent, r);
        if instance.resource(r).partition.is_some()
            && soln.layer_duration(layer) * 10 >= parent_duration * 9
        {
            for child in soln.layer_children(layer) {
                if let Some(rn) = nodes.iter_mut().find(|n| n.node == *child) {
                    rn.resources.push(r);
                }
            }
        }
        soln.layer_delete(layer);
    }

    nodes.retain(|n| !n.resources.is_empty());
    nodes.sort_by(|a, b| a.resources.cmp(&b.resources).then(a.node.cmp(&b.node)));
    debug!(
        %parent,
        candidates = nodes.len(),
        templates = templates.template_count(),
        u,
        v,
        "runaround candidates"
    );

    let mut builder = Builder {
        parent,
        templates: &templates,
        u,
        v,
        solver: runaround_solver,
        options,
        made: 0,
    };
    for run in nodes.chunk_by(|a, b| a.resources == b.resources) {
        if run.iter().any(|n| n.problem) {
            builder.handle_mergeable_set(soln, run.to_vec());
        }
    }
    debug!(%parent, made = builder.made, cost = %soln.cost(), "built runarounds");
    builder.made
}

#[cfg(test)]
#[path = "runarounds_tests.rs"]
mod tests;
