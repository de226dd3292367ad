use std::ops::Add;

use derive_more::Display;

// We use a simple discrete time model. Time values are signed because the
// analysis works with differences of instants: reachability-graph edge
// weights and slack candidates may well be negative.
pub type Time = i64;

// Syntactic sugar to give a hint as to whether a time value denotes an
// interval length or a specific point in time.
pub type Instant = Time;
pub type Duration = Time;

/// The weight of a reachability-graph edge.
///
/// Most edges carry a finite (possibly negative) weight. Edges leading into
/// a dead end are tagged [Weight::NegInfinity], which is absorbing under
/// addition and compares less than every finite weight, so such edges can
/// never contribute to a longest path.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Weight {
    /// Unusable edge or unreachable node.
    #[display(fmt = "-inf")]
    NegInfinity,
    /// A usable edge with the given latency change.
    #[display(fmt = "{}", _0)]
    Finite(Time),
}

impl Weight {
    /// The finite value, if any.
    pub fn finite(self) -> Option<Time> {
        match self {
            Weight::Finite(w) => Some(w),
            Weight::NegInfinity => None,
        }
    }

    /// Does the weight carry a usable (finite) value?
    pub fn is_finite(self) -> bool {
        matches!(self, Weight::Finite(_))
    }
}

impl From<Time> for Weight {
    fn from(val: Time) -> Self {
        Weight::Finite(val)
    }
}

impl Add for Weight {
    type Output = Weight;

    fn add(self, rhs: Weight) -> Weight {
        match (self, rhs) {
            (Weight::Finite(a), Weight::Finite(b)) => Weight::Finite(a + b),
            _ => Weight::NegInfinity,
        }
    }
}

// Exact ceiling division for a possibly negative numerator and a positive
// denominator. Plain `/` truncates towards zero, which is a floor only for
// non-negative numerators.
pub(crate) fn div_ceil(numerator: Time, denominator: Duration) -> Time {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    if numerator % denominator > 0 {
        quotient + 1
    } else {
        quotient
    }
}
