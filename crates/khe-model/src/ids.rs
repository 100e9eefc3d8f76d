//! Typed indexes into instance and solution arenas.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A time of the instance's cycle.
    TimeId, "T"
);
define_id!(ResourceTypeId, "RT");
define_id!(
    /// A resource: a teacher, room, class and so on.
    ResourceId, "R"
);
define_id!(EventId, "E");
define_id!(ConstraintId, "C");

define_id!(
    /// A meet: a block of time of fixed duration, possibly assigned into
    /// another meet.
    MeetId, "M"
);
define_id!(
    /// A node of the layer tree.
    NodeId, "N"
);
define_id!(LayerId, "L");
define_id!(
    /// A task: one resource requirement of a meet.
    TaskId, "K"
);
define_id!(
    /// A demand node of the matching: one task offset or one workload
    /// requirement unit.
    DemandId, "D"
);
define_id!(MeetBoundId, "B");
define_id!(MeetBoundGroupId, "BG");
define_id!(ZoneId, "Z");
define_id!(GroupMonitorId, "G");
