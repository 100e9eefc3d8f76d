//! KHE - High School Timetabling in Rust
//!
//! Assigns times to the events of a high school timetabling instance.
//!
//! # Example
//!
//! ```
//! use khe::prelude::*;
//! use khe_test::small_school;
//!
//! let options = SolveOptions::default().with_attempts(2).with_keep_best(1);
//! let best = khe::solve(&small_school(), &options);
//! assert_eq!(best.len(), 1);
//! assert_eq!(best[0].cost(), Cost::ZERO);
//! ```

pub mod logging;
mod solve;

pub use solve::{assign_times, solve};

pub use khe_config::{ConfigError, RepairMove, SolveOptions, ThreadCount};
pub use khe_core::{Cost, KheError, LSet, Partition};
pub use khe_model::{Instance, InstanceBuilder, MeetId, NodeId, Soln};
pub use khe_solver::{KempeStats, LayeredAssign, RunaroundAssign, SimpleAssign, TimeEquiv, TimeSolver};

/// The types most callers need.
pub mod prelude {
    pub use crate::{assign_times, solve};
    pub use khe_config::{SolveOptions, ThreadCount};
    pub use khe_core::Cost;
    pub use khe_model::{Instance, InstanceBuilder, Soln};
    pub use khe_solver::TimeSolver;
}
