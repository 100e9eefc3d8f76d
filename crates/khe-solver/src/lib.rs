//! KHE Time Solvers
//!
//! This crate provides the time-assignment algorithms that run over a
//! [`khe_model::Soln`], including:
//! - The [`TimeSolver`] abstraction and simple best-cost assignment
//! - Runaround construction and runaround time assignment
//! - Layered time assignment with parallel assignment and repair
//! - Kempe, ejecting and basic meet moves
//! - Time equivalence of events and resources
//! - Workload requirements for the resource matching
//! - Best-of-N solving on worker threads

pub mod basic;
pub mod kempe;
pub mod layered;
pub mod parallel;
pub mod parallel_assign;
pub mod repair;
pub mod runaround;
pub mod runarounds;
pub mod stats;
pub mod time_equiv;
pub mod time_solver;
pub mod workload;

pub use basic::{
    layer_all_child_meets_assigned, layer_preassigned_assign_times, layer_simple_assign_times,
    layer_unassign_times, node_all_child_meets_assigned, node_preassigned_assign_times,
    node_recursive_assign_times, node_simple_assign_times, node_unassign_times,
    try_meet_unassignments,
};
pub use kempe::{
    basic_meet_move, basic_meet_move_time, ejecting_meet_move, ejecting_meet_move_time,
    kempe_demand_group_monitor_make, kempe_meet_move, kempe_meet_move_time, Frame, KempeFailure,
    KempeMove,
};
pub use layered::{node_layered_assign_times, LayeredAssign};
pub use parallel::parallel_solve;
pub use parallel_assign::layer_parallel_assign_times;
pub use repair::{layer_repair_times, node_repair_times};
pub use runaround::{runaround_node_assign_times, RunaroundAssign};
pub use runarounds::{build_runarounds, minimum_runaround_duration, NodeTemplate, NodeTemplateSet};
pub use stats::KempeStats;
pub use time_equiv::TimeEquiv;
pub use time_solver::{SimpleAssign, TimeSolver};
pub use workload::{event_clusters, workload_requirements, EventCluster};
