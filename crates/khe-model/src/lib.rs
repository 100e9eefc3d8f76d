//! KHE Model - the instance and the solution structures built over it
//!
//! An [`Instance`] holds times, resources, events and constraints. A
//! [`Soln`] holds everything a solver manipulates:
//! - meets, blocks of time assigned into other meets and ultimately into
//!   the cycle meets that represent the instance's times
//! - nodes and layers, the tree and cross-cutting views used to structure
//!   time assignment
//! - meet bounds and zones
//! - the demand matching between resource requirements and
//!   (resource, time) supply, with group monitors and traces
//! - marks, which undo any sequence of changes exactly

pub mod error;
pub mod ids;
pub mod instance;
pub mod soln;

#[cfg(test)]
mod test_utils;

pub use error::ModelError;
pub use ids::{
    ConstraintId, DemandId, EventId, GroupMonitorId, LayerId, MeetBoundGroupId, MeetBoundId,
    MeetId, NodeId, ResourceId, ResourceTypeId, TaskId, TimeId, ZoneId,
};
pub use instance::{
    Block, Constraint, ConstraintKind, Event, EventResource, Instance, InstanceBuilder, Resource,
    ResourceType, Time,
};
pub use soln::{DemandKind, Mark, MonitorTag, Soln, Trace};
