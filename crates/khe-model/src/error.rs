//! Errors raised while building an instance.

use thiserror::Error;

use khe_core::KheError;

/// Error building an [`Instance`](crate::Instance).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("instance has no times")]
    NoTimes,

    #[error("unknown time index {0}")]
    UnknownTime(usize),

    #[error("unknown resource index {0}")]
    UnknownResource(usize),

    #[error("unknown resource type index {0}")]
    UnknownResourceType(usize),

    #[error("unknown event index {0}")]
    UnknownEvent(usize),

    #[error("event {0} has zero duration")]
    ZeroDuration(String),

    #[error("event {event}: resource {resource} is not of the event resource's type")]
    ResourceTypeMismatch { event: String, resource: String },

    #[error("event {event}: preassigned time {time} leaves no room for duration {duration}")]
    PreassignedTimeOverflow {
        event: String,
        time: String,
        duration: usize,
    },

    #[error("invalid instance: {0}")]
    Invalid(String),
}

impl From<ModelError> for KheError {
    fn from(e: ModelError) -> Self {
        KheError::Model(e.to_string())
    }
}
