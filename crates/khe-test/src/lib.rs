//! Shared test fixtures for KHE crates.
//!
//! This crate provides small instances and solutions for testing solvers.
//! It depends only on `khe-core` and `khe-model`.
//!
//! - [`school`] - one-block instances with teachers and preassigned events
//! - [`small_school`] - a two-day instance with teachers and classes
//! - [`two_block_cycle`] - a cycle of two blocks of three times each
//! - [`nested_node_soln`] - a solution whose event nodes lie below the cycle node
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! khe-test = { workspace = true }
//! ```

pub mod school;

pub use school::{
    nested_node_soln, school, school_builder, small_school, soln_of, time, times,
    two_block_cycle,
};
