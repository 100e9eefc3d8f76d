//! Cost - two-level hard/soft solution cost, lower is better

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// The cost of a solution, or of one part of it.
///
/// Hard cost measures violations of required constraints; soft cost measures
/// violations of the rest. Costs compare lexicographically, hard first, and
/// a smaller cost is a better solution.
///
/// # Examples
///
/// ```
/// use khe_core::Cost;
///
/// let clash = Cost::of(1, 0);     // one hard violation
/// let untidy = Cost::of(0, 40);   // feasible but poor
///
/// // Any hard violation is worse than any amount of soft cost
/// assert!(untidy < clash);
///
/// assert_eq!(Cost::ONE_HARD + Cost::of_soft(3), Cost::of(1, 3));
/// assert_eq!("2hard/5soft".parse::<Cost>().unwrap(), Cost::of(2, 5));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cost {
    hard: i64,
    soft: i64,
}

impl Cost {
    /// The zero cost.
    pub const ZERO: Cost = Cost { hard: 0, soft: 0 };

    /// One hard violation.
    pub const ONE_HARD: Cost = Cost { hard: 1, soft: 0 };

    /// One soft violation.
    pub const ONE_SOFT: Cost = Cost { hard: 0, soft: 1 };

    /// Creates a new cost.
    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        Cost { hard, soft }
    }

    /// Creates a cost with only a hard component.
    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        Cost { hard, soft: 0 }
    }

    /// Creates a cost with only a soft component.
    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        Cost { hard: 0, soft }
    }

    /// The combined weight of a constraint: hard when required, else soft.
    #[inline]
    pub const fn combined_weight(required: bool, weight: i64) -> Self {
        if required {
            Cost::of_hard(weight)
        } else {
            Cost::of_soft(weight)
        }
    }

    /// Returns the hard component.
    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    /// Returns the soft component.
    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }

    /// True when there is no hard cost.
    #[inline]
    pub const fn is_feasible(&self) -> bool {
        self.hard <= 0
    }

    /// True when both components are zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.hard == 0 && self.soft == 0
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.hard.cmp(&other.hard) {
            Ordering::Equal => self.soft.cmp(&other.soft),
            other => other,
        }
    }
}

impl_cost_ops!(Cost { hard, soft } => of);

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cost({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}hard/{}soft", self.hard, self.soft)
    }
}

/// Error when parsing a cost from its `"1hard/2soft"` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CostParseError {
    pub message: String,
}

impl_cost_parse!(Cost { hard => "hard", soft => "soft" } => of);

#[cfg(test)]
#[path = "cost_tests.rs"]
mod tests;
