//! Time assignment for runaround nodes.
//!
//! Each child layer of the node keeps the free intervals of the parent's
//! meets. Meets are placed largest first; for each duration the layers are
//! sorted so that layers with equal free intervals sit together, and layer
//! `i` starts looking `i` intervals along, which spreads similar layers
//! across the parent's meets in rotation.

use khe_config::SolveOptions;
use khe_model::{MeetId, NodeId, Soln};
use tracing::{debug, trace};

use crate::layered::node_layered_assign_times;
use crate::time_solver::TimeSolver;

/// Assigns the child meets of a runaround node, falling back to layered
/// assignment when the rotation fails.
///
/// See [`runaround_node_assign_times`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunaroundAssign;

impl TimeSolver for RunaroundAssign {
    fn solve(&self, soln: &mut Soln, node: NodeId, options: &SolveOptions) -> bool {
        runaround_node_assign_times(soln, node, options)
    }
}

/// A free interval of a parent meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Asst {
    meet: MeetId,
    offset: usize,
    durn: usize,
}

impl Asst {
    fn end(&self) -> usize {
        self.offset + self.durn
    }
}

#[derive(Debug)]
struct ChildLayer {
    nodes: Vec<usize>,
    assts: Vec<Asst>,
}

impl ChildLayer {
    /// Removes `[offset, offset + durn)` of `meet` from the free intervals.
    fn record_asst(&mut self, meet: MeetId, offset: usize, durn: usize) {
        let stop = offset + durn;
        let mut i = 0;
        while i < self.assts.len() {
            let asst = self.assts[i];
            if asst.meet != meet || asst.end() <= offset || stop <= asst.offset {
                i += 1;
                continue;
            }
            let (lo, hi) = (offset.max(asst.offset), stop.min(asst.end()));
            let (left, right) = (lo - asst.offset, asst.end() - hi);
            match (left > 0, right > 0) {
                (false, false) => {
                    self.assts.remove(i);
                    continue;
                }
                (true, false) => self.assts[i].durn = left,
                (false, true) => self.assts[i] = Asst { meet, offset: hi, durn: right },
                (true, true) => {
                    self.assts[i].durn = left;
                    self.assts.push(Asst { meet, offset: hi, durn: right });
                }
            }
            i += 1;
        }
    }

    /// Candidate positions for a meet of duration `durn`, visiting each
    /// interval long enough once, cyclically from the `shift`th such.
    ///
    /// With `across`, every `durn`th offset of each interval is returned;
    /// otherwise one offset per interval, chosen by `shift`.
    fn positions(&self, durn: usize, across: bool, shift: usize) -> Vec<(MeetId, usize)> {
        let suitable: Vec<&Asst> = self.assts.iter().filter(|a| a.durn >= durn).collect();
        if suitable.is_empty() {
            return Vec::new();
        }
        let start = shift % suitable.len();
        let mut res = Vec::new();
        for k in 0..suitable.len() {
            let asst = suitable[(start + k) % suitable.len()];
            if across {
                let mut offset = asst.offset;
                while offset + durn <= asst.end() {
                    res.push((asst.meet, offset));
                    offset += durn;
                }
            } else {
                let room = asst.durn - durn + 1;
                res.push((asst.meet, asst.offset + (shift * durn) % room));
            }
        }
        res
    }
}

#[derive(Debug)]
struct ChildNode {
    node: NodeId,
    layers: Vec<usize>,
}

struct RunaroundSolver {
    nodes: Vec<ChildNode>,
    layers: Vec<ChildLayer>,
    order: Vec<usize>,
    max_unassigned_durn: usize,
}

/// True when some meet of `node` is assigned to `target`.
fn target_used(soln: &Soln, node: NodeId, target: MeetId) -> bool {
    soln.node_meets(node)
        .iter()
        .any(|m| soln.meet_asst(*m) == Some(target))
}

/// Assigns `meet` to `target` at `offset` and keeps it when the cost did
/// not go up. With `avoid_dups`, refuses targets already used by another
/// meet of the same node.
fn try_asst(
    soln: &mut Soln,
    meet: MeetId,
    target: MeetId,
    offset: usize,
    avoid_dups: bool,
) -> bool {
    if avoid_dups {
        if let Some(node) = soln.meet_node(meet) {
            if target_used(soln, node, target) {
                return false;
            }
        }
    }
    let init_cost = soln.cost();
    if !soln.meet_assign(meet, target, offset) {
        return false;
    }
    if soln.cost() <= init_cost {
        trace!(%meet, %target, offset, avoid_dups, "runaround assignment");
        return true;
    }
    soln.meet_unassign(meet);
    false
}

impl RunaroundSolver {
    fn new(soln: &Soln, parent: NodeId) -> Self {
        let parent_assts: Vec<Asst> = soln
            .node_meets(parent)
            .iter()
            .map(|m| Asst {
                meet: *m,
                offset: 0,
                durn: soln.meet_duration(*m),
            })
            .collect();
        let child_layers = soln.node_child_layers(parent);
        let mut layers: Vec<ChildLayer> = child_layers
            .iter()
            .map(|_| ChildLayer {
                nodes: Vec::new(),
                assts: parent_assts.clone(),
            })
            .collect();

        let mut nodes = Vec::new();
        for child in soln.node_children(parent) {
            let in_layers: Vec<usize> = soln
                .node_parent_layers(*child)
                .iter()
                .filter_map(|l| child_layers.iter().position(|cl| cl == l))
                .collect();
            for l in &in_layers {
                layers[*l].nodes.push(nodes.len());
            }
            nodes.push(ChildNode {
                node: *child,
                layers: in_layers,
            });
        }
        for layer in &mut layers {
            layer.nodes.sort_by(|a, b| {
                let (na, nb) = (nodes[*a].node, nodes[*b].node);
                soln.node_meet_count(nb)
                    .cmp(&soln.node_meet_count(na))
                    .then(na.cmp(&nb))
            });
        }

        Self {
            order: (0..layers.len()).collect(),
            nodes,
            layers,
            max_unassigned_durn: soln.node_max_unassigned_child_duration(parent),
        }
    }

    fn record_asst(&mut self, node: usize, meet: MeetId, offset: usize, durn: usize) {
        for l in &self.nodes[node].layers {
            self.layers[*l].record_asst(meet, offset, durn);
        }
    }

    fn record_existing_assignments(&mut self, soln: &Soln) {
        for i in 0..self.nodes.len() {
            for meet in soln.node_meets(self.nodes[i].node) {
                if let Some((target, offset)) = soln.meet_asst_pair(*meet) {
                    self.record_asst(i, target, offset, soln.meet_duration(*meet));
                }
            }
        }
    }

    fn sort_layers(&mut self) {
        for layer in &mut self.layers {
            layer.assts.sort();
        }
        let layers = &self.layers;
        self.order.sort_by(|a, b| {
            let (la, lb) = (&layers[*a].assts, &layers[*b].assts);
            la.len().cmp(&lb.len()).then_with(|| la.cmp(lb))
        });
    }

    /// Assigns the unassigned meets of duration `durn` of the nodes of
    /// layer `l`, starting `shift` intervals along.
    fn layer_assign(&mut self, soln: &mut Soln, l: usize, durn: usize, shift: usize) -> bool {
        for n in self.layers[l].nodes.clone() {
            for meet in soln.node_meets(self.nodes[n].node).to_vec() {
                if soln.meet_asst(meet).is_some() || soln.meet_duration(meet) != durn {
                    continue;
                }
                // one position per interval first, then every position
                let placed = [(false, true), (true, false)].iter().any(|(across, avoid_dups)| {
                    let positions = self.layers[l].positions(durn, *across, shift);
                    let found = positions.into_iter().find(|(target, offset)| {
                        try_asst(soln, meet, *target, *offset, *avoid_dups)
                    });
                    match found {
                        Some((target, offset)) => {
                            self.record_asst(n, target, offset, durn);
                            true
                        }
                        None => false,
                    }
                });
                if !placed {
                    trace!(%meet, durn, "no runaround position");
                    return false;
                }
            }
        }
        true
    }

    fn solve(&mut self, soln: &mut Soln) -> bool {
        for durn in (1..=self.max_unassigned_durn).rev() {
            self.sort_layers();
            for (shift, l) in self.order.clone().into_iter().enumerate() {
                if !self.layer_assign(soln, l, durn, shift) {
                    return false;
                }
            }
        }
        true
    }
}

/// Assigns times to the child meets of the runaround node `parent`.
///
/// The rotation runs under a mark and is undone entirely if any meet
/// cannot be placed without raising the cost. In that case layered
/// assignment is tried instead, without a vizier node, node regularity or
/// ejecting moves, since ejecting moves may unassign meets.
pub fn runaround_node_assign_times(
    soln: &mut Soln,
    parent: NodeId,
    options: &SolveOptions,
) -> bool {
    if soln.node_child_count(parent) == 0 {
        return true;
    }
    soln.node_child_layers_make(parent);
    let mut rs = RunaroundSolver::new(soln, parent);

    let mark = soln.mark_begin();
    rs.record_existing_assignments(soln);
    let mut success = rs.solve(soln);
    soln.mark_end(mark, !success);
    soln.node_child_layers_delete(parent);
    debug!(node = %parent, success, layers = rs.layers.len(), "runaround assign");

    if !success {
        let fallback = options
            .clone()
            .with_vizier_node(false)
            .with_node_regularity(false)
            .with_ejecting_not_basic(false);
        success = node_layered_assign_times(soln, parent, &fallback);
        debug!(node = %parent, success, "runaround fallback to layered assign");
    }
    success
}

#[cfg(test)]
#[path = "runaround_tests.rs"]
mod tests;
