use std::collections::BTreeMap;

use auto_impl::auto_impl;
use derive_more::Display;
use thiserror::Error;

use crate::time::{Duration, Instant};

/// Execution semantics of a periodic task.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Semantic {
    /// *Bounded execution time*: the output becomes available somewhere
    /// between BCRT and WCRT after release.
    #[display(fmt = "BET")]
    Bet,
    /// *Logical execution time*: the output is published exactly λ after
    /// activation, regardless of when the computation finishes.
    #[display(fmt = "LET")]
    Let,
}

/// Best- and worst-case response-time bounds of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseTime {
    /// Best-case response time.
    pub bcrt: Duration,
    /// Worst-case response time.
    pub wcrt: Duration,
}

/// The interface through which externally computed response-time bounds
/// reach the analysis.
///
/// An oracle maps a task identifier to its response-time bounds, if known.
/// Bounds stored on a [Task] itself take precedence over the oracle.
#[auto_impl(&, Box, Rc)]
pub trait ResponseTimeOracle {
    /// Response-time bounds for the task with the given identifier, if the
    /// oracle knows any.
    fn response_time(&self, task: &str) -> Option<ResponseTime>;
}

/// The oracle that knows nothing.
///
/// Useful for task sets whose response times are given directly on the
/// tasks, and for chains of LET tasks, which need no response-time bounds
/// at all.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOracle;

impl ResponseTimeOracle for NoOracle {
    fn response_time(&self, _task: &str) -> Option<ResponseTime> {
        None
    }
}

impl ResponseTimeOracle for BTreeMap<String, ResponseTime> {
    fn response_time(&self, task: &str) -> Option<ResponseTime> {
        self.get(task).copied()
    }
}

/// Errors arising from contradictory or incomplete task and chain
/// parameters. All of them are fatal for the affected analysis run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Tasks must be strictly periodic.
    #[error("task {task}: period {period} is not positive")]
    NonPositivePeriod { task: String, period: Duration },
    /// The release offset must fall within one period.
    #[error("task {task}: release offset {offset} lies outside [0, {period})")]
    OffsetOutOfRange {
        task: String,
        offset: Instant,
        period: Duration,
    },
    /// A BET task needs a positive WCET bound.
    #[error("task {task}: BET semantics require a positive WCET bound")]
    MissingWcet { task: String },
    /// Execution-time bounds must be ordered.
    #[error("task {task}: BCET {bcet} exceeds WCET {wcet}")]
    BcetExceedsWcet {
        task: String,
        bcet: Duration,
        wcet: Duration,
    },
    /// A LET task needs a positive logical execution time.
    #[error("task {task}: LET semantics require a positive logical execution time")]
    MissingLet { task: String },
    /// A BET task must not carry a logical execution time.
    #[error("task {task}: contradictory parameters, a BET task cannot carry a logical execution time")]
    UnexpectedLet { task: String },
    /// Only interconnect tasks may stretch their logical execution time
    /// beyond the period.
    #[error(
        "task {task}: logical execution time {let_interval} exceeds period {period}, \
         which only interconnect tasks may do"
    )]
    LetExceedsPeriod {
        task: String,
        let_interval: Duration,
        period: Duration,
    },
    /// The interconnect flag is a LET-only concept.
    #[error("task {task}: only LET tasks can act as interconnect tasks")]
    InterconnectNotLet { task: String },
    /// Response-time bounds must be ordered.
    #[error("task {task}: BCRT {bcrt} exceeds WCRT {wcrt}")]
    BcrtExceedsWcrt {
        task: String,
        bcrt: Duration,
        wcrt: Duration,
    },
    /// For BET tasks the best-case response time is the best-case
    /// execution time.
    #[error("task {task}: a BET task's BCRT {bcrt} must equal its BCET {bcet}")]
    BcrtBcetMismatch {
        task: String,
        bcrt: Duration,
        bcet: Duration,
    },
    /// A BET task without response-time bounds cannot be analyzed.
    #[error("task {task}: no response-time bounds available for a BET task")]
    MissingResponseTime { task: String },
    /// Chains must contain at least one task.
    #[error("chain {chain}: a cause-effect chain must contain at least one task")]
    EmptyChain { chain: String },
}

/// Immutable specification of a periodic activity.
///
/// A task is pure input data; nothing in this crate ever mutates a task.
/// Optional fields cover the parameters that depend on the semantics
/// (`wcet`, `let_interval`) or that an external oracle may supply later
/// (`bcrt`, `wcrt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier.
    pub name: String,
    /// Activation period.
    pub period: Duration,
    /// Release offset, `0 <= offset < period`.
    pub offset: Instant,
    /// Best-case execution time.
    pub bcet: Duration,
    /// Worst-case execution time (required for BET tasks).
    pub wcet: Option<Duration>,
    /// Execution semantics.
    pub semantic: Semantic,
    /// Logical execution time λ (required for LET tasks).
    pub let_interval: Option<Duration>,
    /// Best-case response time, if known up front.
    pub bcrt: Option<Duration>,
    /// Worst-case response time, if known up front.
    pub wcrt: Option<Duration>,
    /// Explicit relative deadline; implicit deadline = period if absent.
    pub deadline: Option<Duration>,
    /// System-level interconnect task whose λ may exceed its period.
    pub interconnect: bool,
}

impl Task {
    /// A BET task with the given activation pattern and execution-time
    /// bounds.
    pub fn bet(
        name: impl Into<String>,
        period: Duration,
        offset: Instant,
        bcet: Duration,
        wcet: Duration,
    ) -> Self {
        Task {
            name: name.into(),
            period,
            offset,
            bcet,
            wcet: Some(wcet),
            semantic: Semantic::Bet,
            let_interval: None,
            bcrt: None,
            wcrt: None,
            deadline: None,
            interconnect: false,
        }
    }

    /// A LET task publishing its output exactly `let_interval` after each
    /// activation.
    pub fn let_task(
        name: impl Into<String>,
        period: Duration,
        offset: Instant,
        let_interval: Duration,
    ) -> Self {
        Task {
            name: name.into(),
            period,
            offset,
            bcet: 0,
            wcet: None,
            semantic: Semantic::Let,
            let_interval: Some(let_interval),
            bcrt: None,
            wcrt: None,
            deadline: None,
            interconnect: false,
        }
    }

    /// Attach response-time bounds known up front. These take precedence
    /// over whatever a [ResponseTimeOracle] would report.
    pub fn with_response_time(mut self, bcrt: Duration, wcrt: Duration) -> Self {
        self.bcrt = Some(bcrt);
        self.wcrt = Some(wcrt);
        self
    }

    /// Attach an explicit relative deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Mark the task as a system-level interconnect task.
    pub fn as_interconnect(mut self) -> Self {
        self.interconnect = true;
        self
    }

    /// Reject contradictory parameter combinations. Returns the first
    /// violation found, naming the task.
    pub fn validate(&self) -> Result<(), ModelError> {
        let task = || self.name.clone();
        if self.period <= 0 {
            return Err(ModelError::NonPositivePeriod {
                task: task(),
                period: self.period,
            });
        }
        if self.offset < 0 || self.offset >= self.period {
            return Err(ModelError::OffsetOutOfRange {
                task: task(),
                offset: self.offset,
                period: self.period,
            });
        }
        match self.semantic {
            Semantic::Bet => {
                let wcet = match self.wcet {
                    Some(wcet) if wcet > 0 => wcet,
                    _ => return Err(ModelError::MissingWcet { task: task() }),
                };
                if self.bcet > wcet {
                    return Err(ModelError::BcetExceedsWcet {
                        task: task(),
                        bcet: self.bcet,
                        wcet,
                    });
                }
                if self.let_interval.is_some() {
                    return Err(ModelError::UnexpectedLet { task: task() });
                }
                if self.interconnect {
                    return Err(ModelError::InterconnectNotLet { task: task() });
                }
            }
            Semantic::Let => {
                let let_interval = match self.let_interval {
                    Some(l) if l > 0 => l,
                    _ => return Err(ModelError::MissingLet { task: task() }),
                };
                if let_interval > self.period && !self.interconnect {
                    return Err(ModelError::LetExceedsPeriod {
                        task: task(),
                        let_interval,
                        period: self.period,
                    });
                }
            }
        }
        if let (Some(bcrt), Some(wcrt)) = (self.bcrt, self.wcrt) {
            if bcrt > wcrt {
                return Err(ModelError::BcrtExceedsWcrt {
                    task: task(),
                    bcrt,
                    wcrt,
                });
            }
        }
        Ok(())
    }
}

/// The semantic-specific timing parameters of a resolved task.
///
/// Making the two shapes explicit renders "BET without WCRT" and "LET
/// without λ" unrepresentable after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Bounded execution time with concrete response-time bounds.
    Bet { bcrt: Duration, wcrt: Duration },
    /// Logical execution time; a response-time bound is optional and only
    /// feeds the robustness margin.
    Let {
        let_interval: Duration,
        wcrt: Option<Duration>,
    },
}

/// A chain task bound to the concrete timing parameters of one analysis
/// run.
///
/// Resolution is where all semantic consistency checks happen; a resolved
/// task can instantiate jobs without any further failure mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    /// Unique identifier.
    pub name: String,
    /// Activation period.
    pub period: Duration,
    /// Release offset.
    pub offset: Instant,
    /// Best-case execution time.
    pub bcet: Duration,
    /// Explicit relative deadline, if any.
    pub deadline: Option<Duration>,
    /// System-level interconnect task.
    pub interconnect: bool,
    /// Resolved semantic-specific parameters.
    pub timing: Timing,
}

impl ResolvedTask {
    /// Bind a task to concrete response-time bounds, consulting `oracle`
    /// for whatever the task itself does not carry.
    pub fn resolve<O>(task: &Task, oracle: &O) -> Result<Self, ModelError>
    where
        O: ResponseTimeOracle + ?Sized,
    {
        task.validate()?;
        let oracle_rt = oracle.response_time(&task.name);
        let timing = match task.semantic {
            Semantic::Bet => {
                let wcrt = task
                    .wcrt
                    .or_else(|| oracle_rt.map(|rt| rt.wcrt))
                    .ok_or_else(|| ModelError::MissingResponseTime {
                        task: task.name.clone(),
                    })?;
                let bcrt = task
                    .bcrt
                    .or_else(|| oracle_rt.map(|rt| rt.bcrt))
                    .unwrap_or(task.bcet);
                if bcrt != task.bcet {
                    return Err(ModelError::BcrtBcetMismatch {
                        task: task.name.clone(),
                        bcrt,
                        bcet: task.bcet,
                    });
                }
                if bcrt > wcrt {
                    return Err(ModelError::BcrtExceedsWcrt {
                        task: task.name.clone(),
                        bcrt,
                        wcrt,
                    });
                }
                Timing::Bet { bcrt, wcrt }
            }
            Semantic::Let => {
                // validate() has established that λ is present and positive
                let let_interval = task.let_interval.ok_or_else(|| ModelError::MissingLet {
                    task: task.name.clone(),
                })?;
                let wcrt = task.wcrt.or_else(|| oracle_rt.map(|rt| rt.wcrt));
                Timing::Let { let_interval, wcrt }
            }
        };
        Ok(ResolvedTask {
            name: task.name.clone(),
            period: task.period,
            offset: task.offset,
            bcet: task.bcet,
            deadline: task.deadline,
            interconnect: task.interconnect,
            timing,
        })
    }

    /// The execution semantics of the task.
    pub fn semantic(&self) -> Semantic {
        match self.timing {
            Timing::Bet { .. } => Semantic::Bet,
            Timing::Let { .. } => Semantic::Let,
        }
    }

    /// The delay after a job's activation at which its output is
    /// guaranteed to be out: the WCRT for BET tasks, λ for LET tasks.
    pub fn tail(&self) -> Duration {
        match self.timing {
            Timing::Bet { wcrt, .. } => wcrt,
            Timing::Let { let_interval, .. } => let_interval,
        }
    }
}
