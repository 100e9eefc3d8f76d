//! KHE Core - value types shared by the timetabling engine
//!
//! This crate provides the leaf abstractions every other KHE crate uses:
//! - [`Cost`], the lexicographic hard/soft cost of a solution
//! - [`LSet`], an arbitrary-length set of small non-negative integers
//! - [`Partition`], an integer partition with multiset algebra and bin packing
//! - The shared error type

#[macro_use]
mod macros;

pub mod cost;
pub mod error;
pub mod lset;
pub mod partition;

pub use cost::{Cost, CostParseError};
pub use error::{KheError, Result};
pub use lset::LSet;
pub use partition::{Partition, PartitionParseError};
