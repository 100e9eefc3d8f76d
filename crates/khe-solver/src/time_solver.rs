//! The time solver abstraction.

use khe_config::SolveOptions;
use khe_model::{NodeId, Soln};

use crate::basic::node_simple_assign_times;

/// Assigns times to the meets of the child nodes of a node.
///
/// Implementations return true when every child meet ended up assigned.
/// On failure they leave whatever assignments they managed to make.
///
/// Closures of the matching shape are time solvers too:
///
/// ```
/// use khe_config::SolveOptions;
/// use khe_model::{NodeId, Soln};
/// use khe_solver::TimeSolver;
///
/// let always = |_: &mut Soln, _: NodeId, _: &SolveOptions| true;
/// let solver: &dyn TimeSolver = &always;
/// # let _ = solver;
/// ```
pub trait TimeSolver: Send + Sync {
    fn solve(&self, soln: &mut Soln, node: NodeId, options: &SolveOptions) -> bool;
}

impl<F> TimeSolver for F
where
    F: Fn(&mut Soln, NodeId, &SolveOptions) -> bool + Send + Sync,
{
    fn solve(&self, soln: &mut Soln, node: NodeId, options: &SolveOptions) -> bool {
        self(soln, node, options)
    }
}

/// Best-cost greedy assignment, largest meets first.
///
/// See [`node_simple_assign_times`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAssign;

impl TimeSolver for SimpleAssign {
    fn solve(&self, soln: &mut Soln, node: NodeId, _options: &SolveOptions) -> bool {
        node_simple_assign_times(soln, node)
    }
}
