//! Kempe, ejecting and basic meet moves.
//!
//! A Kempe meet move moves a meet and then, phase by phase, moves the meets
//! whose preassigned resources it clashes with into the space it vacated,
//! until no clashes remain. Clashes are found by tracing the demand nodes
//! of preassigned tasks (the Kempe demand group monitor) and asking the
//! matching for competitors of the ones whose cost went up.
//!
//! Neither the Kempe nor the ejecting move undoes its own partial work on
//! failure. Callers must hold an open mark and undo it when a move fails.

use khe_model::{
    ConstraintKind, DemandKind, GroupMonitorId, MeetId, MonitorTag, NodeId, ResourceId, Soln,
    TimeId, Trace,
};
use thiserror::Error;
use tracing::trace;

use crate::stats::KempeStats;

/// Why a Kempe, ejecting or basic meet move failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KempeFailure {
    #[error("meet is already at the target position")]
    NoChange,

    #[error("an underlying meet move was not allowed")]
    Move,

    #[error("resource {0} is unavailable at the target times")]
    Unavailable(ResourceId),

    #[error("a competitor does not lie below the target meet")]
    TargetMeet,

    #[error("a meet would move twice")]
    ReMove,

    #[error("the clash frames admit no exchange")]
    Frames,

    #[error("{0} protrudes from its frame")]
    Protruding(MeetId),

    #[error("the move would increase node irregularity")]
    Regularity,

    #[error("a competitor lies outside the target meet")]
    Scope,

    #[error("a competitor could not be unassigned")]
    Unassign,
}

/// The outcome of a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KempeMove {
    /// Total demand of the meets moved.
    pub demand: usize,
    /// True when no meet other than the one requested was moved.
    pub basic: bool,
}

/// A span `[start, stop)` of offsets within a target meet.
///
/// Offsets are signed so that translated frames may fall outside their
/// target; such frames are not legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub target: MeetId,
    pub start: isize,
    pub stop: isize,
}

impl Frame {
    pub fn new(target: MeetId, start: isize, stop: isize) -> Self {
        Self {
            target,
            start,
            stop,
        }
    }

    /// The frame occupied by the assigned `meet`.
    pub fn of_meet(soln: &Soln, meet: MeetId) -> Self {
        let Some((target, offset)) = soln.meet_asst_pair(meet) else {
            panic!("Frame::of_meet: {} is unassigned", meet);
        };
        let start = offset as isize;
        Self::new(target, start, start + soln.meet_duration(meet) as isize)
    }

    /// The smallest frame enclosing `meets`, which must all be assigned to
    /// the same target.
    pub fn enclosing(soln: &Soln, meets: &[MeetId]) -> Self {
        assert!(!meets.is_empty(), "Frame::enclosing: no meets");
        let mut res = Self::of_meet(soln, meets[0]);
        for meet in &meets[1..] {
            res.enlarge_for_meet(soln, *meet);
        }
        res
    }

    pub fn enlarge_for_meet(&mut self, soln: &Soln, meet: MeetId) {
        let other = Self::of_meet(soln, meet);
        assert_eq!(
            other.target, self.target,
            "Frame::enlarge_for_meet: {} has a different target",
            meet
        );
        self.start = self.start.min(other.start);
        self.stop = self.stop.max(other.stop);
    }

    pub fn duration(&self) -> isize {
        self.stop - self.start
    }

    /// True when `0 <= start < stop <= duration(target)`.
    pub fn is_legal(&self, soln: &Soln) -> bool {
        0 <= self.start
            && self.start < self.stop
            && self.stop <= soln.meet_duration(self.target) as isize
    }

    pub fn overlaps(&self, other: &Frame) -> bool {
        self.target == other.target && other.start < self.stop && self.start < other.stop
    }

    /// True when `meet` is assigned to this frame's target, within it.
    pub fn contains_meet(&self, soln: &Soln, meet: MeetId) -> bool {
        match soln.meet_asst_pair(meet) {
            Some((target, offset)) if target == self.target => {
                let start = offset as isize;
                start >= self.start && start + soln.meet_duration(meet) as isize <= self.stop
            }
            _ => false,
        }
    }

    fn translated(&self, target: MeetId, delta: isize) -> Self {
        Self::new(target, self.start + delta, self.stop + delta)
    }
}

/// Watches the irregularity of two nodes across a move.
struct IrregularityWatch {
    nodes: [Option<NodeId>; 2],
    init: usize,
}

impl IrregularityWatch {
    fn new(soln: &Soln, preserve: bool, meet: MeetId, target: MeetId) -> Self {
        let nodes = if preserve {
            [soln.meet_node(meet), soln.meet_node(target)]
        } else {
            [None, None]
        };
        let mut res = Self { nodes, init: 0 };
        res.init = res.current(soln);
        res
    }

    fn current(&self, soln: &Soln) -> usize {
        self.nodes
            .iter()
            .flatten()
            .map(|n| soln.node_irregularity(*n))
            .sum()
    }

    fn increased(&self, soln: &Soln) -> bool {
        self.current(soln) > self.init
    }
}

/// Makes a group monitor over every demand node of every preassigned task,
/// tagged [`MonitorTag::KempeDemand`]. Kempe and ejecting moves trace it.
pub fn kempe_demand_group_monitor_make(soln: &mut Soln) -> GroupMonitorId {
    let group = soln.group_monitor_make(MonitorTag::KempeDemand);
    let dns: Vec<_> = soln
        .tasks()
        .filter(|t| soln.task_preassigned(*t).is_some())
        .flat_map(|t| soln.task_demand_nodes(t).to_vec())
        .collect();
    for dn in dns {
        soln.group_monitor_add_demand(group, dn);
    }
    group
}

fn kempe_group(soln: &Soln, meet: MeetId) -> Option<GroupMonitorId> {
    let task = soln.meet_find_preassigned_task(meet)?;
    let dn = *soln.task_demand_nodes(task).first()?;
    let group = soln.demand_group_monitor(dn, MonitorTag::KempeDemand);
    assert!(group.is_some(), "cannot find Kempe demand group monitor");
    group
}

/// Runs `f` with a trace open on `group`, closing it whatever the outcome.
fn traced<F>(soln: &mut Soln, group: GroupMonitorId, f: F) -> Result<Trace, KempeFailure>
where
    F: FnOnce(&mut Soln) -> Result<(), KempeFailure>,
{
    soln.trace_begin(group);
    let res = f(soln);
    let trace = soln.trace_end();
    res.map(|()| trace)
}

/// The meet on the assignment chain of `meet` that is assigned directly
/// to `target`, if any.
fn child_of_target(soln: &Soln, mut meet: MeetId, target: MeetId) -> Option<MeetId> {
    loop {
        match soln.meet_asst(meet) {
            Some(t) if t == target => return Some(meet),
            Some(t) => meet = t,
            None => return None,
        }
    }
}

/// Appends to `meets` the meets, directly below `expected_target`, of the
/// preassigned competitors of traced demand nodes that got worse.
///
/// `meets[..*step_start]` were moved in earlier steps; finding one of them
/// again fails. On success `*step_start` advances to the first new meet.
fn find_competitor_meets(
    soln: &Soln,
    trace: &Trace,
    meets: &mut Vec<MeetId>,
    step_start: &mut usize,
    expected_target: MeetId,
    basic: &mut bool,
) -> Result<(), KempeFailure> {
    let next_step_start = meets.len();
    for dn in trace.worsened(soln) {
        for c in soln.demand_competitors(dn) {
            match soln.demand_kind(c) {
                DemandKind::Workload {
                    resource,
                    constraint,
                    ..
                } => {
                    let kind = &soln.instance().constraint(*constraint).kind;
                    if matches!(kind, ConstraintKind::AvoidUnavailableTimes { .. }) {
                        return Err(KempeFailure::Unavailable(*resource));
                    }
                }
                DemandKind::Ordinary { task, .. } => {
                    if soln.task_preassigned(*task).is_none() {
                        continue;
                    }
                    *basic = false;
                    let meet = child_of_target(soln, soln.task_meet(*task), expected_target)
                        .ok_or(KempeFailure::TargetMeet)?;
                    match meets.iter().position(|m| *m == meet) {
                        None => meets.push(meet),
                        Some(pos) if pos < *step_start => return Err(KempeFailure::ReMove),
                        Some(_) => {}
                    }
                }
            }
        }
    }
    *step_start = next_step_start;
    Ok(())
}

fn move_to(soln: &mut Soln, meet: MeetId, target: MeetId, offset: usize) -> Result<(), KempeFailure> {
    if soln.meet_move(meet, Some((target, offset))) {
        Ok(())
    } else {
        Err(KempeFailure::Move)
    }
}

/// Moves the assigned `meet` to `target` at `offset`, then moves the meets
/// it clashes with into the space it left, repeating until no clashes
/// remain.
///
/// With `preserve_regularity`, fails when the irregularity of the nodes of
/// `meet` and `target` goes up. Successful moves are recorded in `stats`.
///
/// # Panics
///
/// Panics if `meet` is unassigned, or if it has a preassigned task but no
/// Kempe demand group monitor was made. Debug builds also panic when no
/// mark is open.
pub fn kempe_meet_move(
    soln: &mut Soln,
    meet: MeetId,
    target: MeetId,
    offset: usize,
    preserve_regularity: bool,
    stats: Option<&mut KempeStats>,
) -> Result<KempeMove, KempeFailure> {
    debug_assert!(
        soln.mark_is_open(),
        "kempe_meet_move: caller must hold an open mark"
    );
    let Some((orig_target, orig_offset)) = soln.meet_asst_pair(meet) else {
        panic!("kempe_meet_move: {} is not assigned", meet);
    };
    if (orig_target, orig_offset) == (target, offset) {
        return Err(KempeFailure::NoChange);
    }
    let orig_meet_frame = Frame::of_meet(soln, meet);
    let watch = IrregularityWatch::new(soln, preserve_regularity, meet, target);

    let Some(group) = kempe_group(soln, meet) else {
        move_to(soln, meet, target, offset)?;
        let demand = soln.meet_demand(meet);
        if watch.increased(soln) {
            return Err(KempeFailure::Regularity);
        }
        if let Some(stats) = stats {
            stats.record(1, 1);
        }
        return Ok(KempeMove {
            demand,
            basic: true,
        });
    };

    let mut basic = true;
    let mut meets = vec![meet];
    let trace = traced(soln, group, |soln| move_to(soln, meet, target, offset))?;
    let mut demand = soln.meet_demand(meet);
    let (mut steps, mut phases) = (1, 1);
    let mut step_start = 0;
    find_competitor_meets(soln, &trace, &mut meets, &mut step_start, target, &mut basic)?;

    if meets.len() > 1 {
        let init_clash_frame = Frame::enclosing(soln, &meets[1..]);
        let mut from = [init_clash_frame; 2];
        let mut to = [init_clash_frame; 2];
        from[0].enlarge_for_meet(soln, meet);
        from[1] = from[0].translated(orig_target, orig_offset as isize - offset as isize);
        if from[1].is_legal(soln) && !from[0].overlaps(&from[1]) {
            // separate: the two lanes swap
            to[1] = from[0];
            to[0] = from[1];
        } else if orig_target != target || init_clash_frame.overlaps(&orig_meet_frame) {
            return Err(KempeFailure::Frames);
        } else {
            // combined: rotate the block made of both frames
            from[0] = init_clash_frame;
            if orig_meet_frame.stop <= init_clash_frame.start {
                from[1] = Frame::new(orig_target, orig_meet_frame.start, from[0].start);
                to[1] = Frame::new(orig_target, from[0].stop - from[1].duration(), from[0].stop);
                to[0] = Frame::new(orig_target, from[1].start, from[1].start + from[0].duration());
            } else {
                from[1] = Frame::new(orig_target, from[0].stop, orig_meet_frame.stop);
                to[1] = Frame::new(orig_target, from[0].start, from[0].start + from[1].duration());
                to[0] = Frame::new(orig_target, from[1].stop - from[0].duration(), from[1].stop);
            }
        }

        let mut py = 0;
        while step_start < meets.len() {
            let step = meets[step_start..].to_vec();
            let (from_frame, to_frame) = (from[py], to[py]);
            let trace = traced(soln, group, |soln| {
                for m in &step {
                    if !from_frame.contains_meet(soln, *m) {
                        return Err(KempeFailure::Protruding(*m));
                    }
                    let current = soln.meet_asst_offset(*m).unwrap_or(0) as isize;
                    let offs = to_frame.start + current - from_frame.start;
                    let offs = usize::try_from(offs).map_err(|_| KempeFailure::Move)?;
                    trace!(meet = %m, phase = py, target = %to_frame.target, offset = offs, "kempe step");
                    move_to(soln, *m, to_frame.target, offs)?;
                    demand += soln.meet_demand(*m);
                    steps += 1;
                }
                Ok(())
            })?;
            phases += 1;
            find_competitor_meets(
                soln,
                &trace,
                &mut meets,
                &mut step_start,
                to_frame.target,
                &mut basic,
            )?;
            py = 1 - py;
        }
    }

    if watch.increased(soln) {
        return Err(KempeFailure::Regularity);
    }
    if let Some(stats) = stats {
        stats.record(steps, phases);
    }
    trace!(%meet, steps, phases, basic, "kempe meet move");
    Ok(KempeMove { demand, basic })
}

/// As [`kempe_meet_move`], moving `meet` to start at time `t`.
pub fn kempe_meet_move_time(
    soln: &mut Soln,
    meet: MeetId,
    t: TimeId,
    preserve_regularity: bool,
    stats: Option<&mut KempeStats>,
) -> Result<KempeMove, KempeFailure> {
    let (target, offset) = soln.time_cycle_meet(t);
    kempe_meet_move(soln, meet, target, offset, preserve_regularity, stats)
}

/// Moves `meet`, which may be unassigned, to `target` at `offset`, then
/// unassigns the meets below `target` whose preassigned resources it
/// clashes with.
///
/// Fails with [`KempeFailure::Unavailable`] when the move takes a resource
/// away from a workload demand node. Like [`kempe_meet_move`], leaves its
/// partial work in place on failure.
pub fn ejecting_meet_move(
    soln: &mut Soln,
    meet: MeetId,
    target: MeetId,
    offset: usize,
    preserve_regularity: bool,
) -> Result<KempeMove, KempeFailure> {
    debug_assert!(
        soln.mark_is_open(),
        "ejecting_meet_move: caller must hold an open mark"
    );
    if soln.meet_asst_pair(meet) == Some((target, offset)) {
        return Err(KempeFailure::NoChange);
    }
    let Some(group) = kempe_group(soln, meet) else {
        move_to(soln, meet, target, offset)?;
        return Ok(KempeMove {
            demand: soln.meet_demand(meet),
            basic: true,
        });
    };
    let watch = IrregularityWatch::new(soln, preserve_regularity, meet, target);
    let trace = traced(soln, group, |soln| move_to(soln, meet, target, offset))?;
    let demand = soln.meet_demand(meet);

    let mut basic = true;
    let mut ejected: Vec<MeetId> = Vec::new();
    for dn in trace.worsened(soln) {
        for c in soln.demand_competitors(dn).into_iter().skip(1) {
            match soln.demand_kind(c) {
                DemandKind::Workload { resource, .. } => {
                    return Err(KempeFailure::Unavailable(*resource));
                }
                DemandKind::Ordinary { task, .. } => {
                    if soln.task_preassigned(*task).is_none() {
                        continue;
                    }
                    basic = false;
                    let m = child_of_target(soln, soln.task_meet(*task), target)
                        .ok_or(KempeFailure::Scope)?;
                    if !ejected.contains(&m) {
                        ejected.push(m);
                    }
                }
            }
        }
    }

    if watch.increased(soln) {
        return Err(KempeFailure::Regularity);
    }
    for m in &ejected {
        if !soln.meet_unassign(*m) {
            return Err(KempeFailure::Unassign);
        }
    }
    trace!(%meet, ejected = ejected.len(), "ejecting meet move");
    Ok(KempeMove { demand, basic })
}

/// As [`ejecting_meet_move`], moving `meet` to start at time `t`.
pub fn ejecting_meet_move_time(
    soln: &mut Soln,
    meet: MeetId,
    t: TimeId,
    preserve_regularity: bool,
) -> Result<KempeMove, KempeFailure> {
    let (target, offset) = soln.time_cycle_meet(t);
    ejecting_meet_move(soln, meet, target, offset, preserve_regularity)
}

/// Moves `meet` to `target` at `offset` with no follow-on moves, failing
/// with [`KempeFailure::Regularity`] when `preserve_regularity` is set and
/// the irregularity of the nodes of `meet` and `target` went up. The move
/// is not undone on that failure.
pub fn basic_meet_move(
    soln: &mut Soln,
    meet: MeetId,
    target: MeetId,
    offset: usize,
    preserve_regularity: bool,
) -> Result<KempeMove, KempeFailure> {
    if soln.meet_asst_pair(meet) == Some((target, offset)) {
        return Err(KempeFailure::NoChange);
    }
    let watch = IrregularityWatch::new(soln, preserve_regularity, meet, target);
    move_to(soln, meet, target, offset)?;
    let demand = soln.meet_demand(meet);
    if watch.increased(soln) {
        return Err(KempeFailure::Regularity);
    }
    Ok(KempeMove {
        demand,
        basic: true,
    })
}

/// As [`basic_meet_move`], moving `meet` to start at time `t`.
pub fn basic_meet_move_time(
    soln: &mut Soln,
    meet: MeetId,
    t: TimeId,
    preserve_regularity: bool,
) -> Result<KempeMove, KempeFailure> {
    let (target, offset) = soln.time_cycle_meet(t);
    basic_meet_move(soln, meet, target, offset, preserve_regularity)
}

#[cfg(test)]
#[path = "kempe_tests.rs"]
mod tests;
