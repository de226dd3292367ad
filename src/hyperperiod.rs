/*! Hyperperiod computation for sets of periodic tasks

The hyperperiod, the least common multiple of all task periods, delimits the
window within which the jobs of a cause-effect chain are instantiated. All
arithmetic is exact: the LCM is computed with Euclid's algorithm and overflow
is detected rather than wrapped, since coprime periods can make the
hyperperiod grow very quickly.
*/

use thiserror::Error;

use crate::time::Duration;

/// Error type returned when a hyperperiod cannot be computed.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum HyperperiodError {
    /// The least common multiple exceeds the representable time range.
    #[error("hyperperiod overflow: lcm({a}, {b}) exceeds the representable time range")]
    Overflow { a: Duration, b: Duration },
    /// A hyperperiod is defined only for non-empty task sets.
    #[error("cannot compute the hyperperiod of an empty task set")]
    EmptyTaskSet,
    /// Periods must be positive.
    #[error("invalid period {period}: periods must be positive")]
    NonPositivePeriod { period: Duration },
}

/// Greatest common divisor of two non-negative durations (Euclid's
/// algorithm).
pub fn gcd(a: Duration, b: Duration) -> Duration {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple of two positive durations, with overflow
/// detection.
pub fn lcm(a: Duration, b: Duration) -> Result<Duration, HyperperiodError> {
    debug_assert!(a > 0 && b > 0);
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// The hyperperiod of a set of periods: the least common multiple of all of
/// them.
pub fn hyperperiod(
    periods: impl IntoIterator<Item = Duration>,
) -> Result<Duration, HyperperiodError> {
    let mut hp: Option<Duration> = None;
    for period in periods {
        if period <= 0 {
            return Err(HyperperiodError::NonPositivePeriod { period });
        }
        hp = Some(match hp {
            None => period,
            Some(h) => lcm(h, period)?,
        });
    }
    hp.ok_or(HyperperiodError::EmptyTaskSet)
}
