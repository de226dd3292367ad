use derive_more::Display;

use super::task::{ResolvedTask, Semantic, Timing};
use crate::time::{Duration, Instant, Time};

/// Ordered identity of a job: owning task plus 1-based instance index.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[display(fmt = "{},{}", task, number)]
pub struct JobId {
    /// Identifier of the owning task.
    pub task: String,
    /// 1-based instance index.
    pub number: u64,
}

/// A single instance of a periodic task, with its derived read and data
/// intervals.
///
/// A job records only its identity, the activation pattern of its owning
/// task, and the four interval bounds; analysis results such as slack and
/// margins live in separate result records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Identifier of the owning task.
    pub task: String,
    /// Activation period of the owning task.
    pub period: Duration,
    /// Release offset of the owning task.
    pub offset: Instant,
    /// Execution semantics of the owning task.
    pub semantic: Semantic,
    /// 1-based instance index.
    pub number: u64,
    /// Earliest instant at which the job may read its input.
    pub rmin: Instant,
    /// Latest instant at which the job may read its input.
    pub rmax: Instant,
    /// Earliest instant at which the job's output is available.
    pub dmin: Instant,
    /// Latest instant up to which the job's output remains the freshest.
    pub dmax: Instant,
}

impl Job {
    /// The job's identity.
    pub fn id(&self) -> JobId {
        JobId {
            task: self.task.clone(),
            number: self.number,
        }
    }
}

impl ResolvedTask {
    /// Instantiate the `number`-th job (1-based) of this task.
    ///
    /// The read interval `[rmin, rmax]` and data interval `[dmin, dmax]`
    /// follow directly from the activation pattern and the resolved timing
    /// parameters. Construction is pure: instantiating the same job twice
    /// yields identical values.
    pub fn instantiate_job(&self, number: u64) -> Job {
        debug_assert!(number >= 1);
        let n = number as Time;
        let rmin = self.offset + (n - 1) * self.period;
        let (rmax, dmin, dmax) = match self.timing {
            Timing::Bet { bcrt, wcrt } => (
                rmin + wcrt - self.bcet,
                rmin + bcrt,
                self.offset + n * self.period + wcrt,
            ),
            Timing::Let { let_interval, .. } => (
                rmin,
                rmin + let_interval,
                self.offset + n * self.period + let_interval,
            ),
        };
        // read and data intervals are well-formed for any validated task
        debug_assert!(rmin <= rmax);
        debug_assert!(rmin <= dmin && dmin <= dmax);
        debug_assert!(rmax <= dmax);
        Job {
            task: self.name.clone(),
            period: self.period,
            offset: self.offset,
            semantic: self.semantic(),
            number,
            rmin,
            rmax,
            dmin,
            dmax,
        }
    }
}
