/*! The task, job, and cause-effect-chain model

This module provides the value types the analyses operate on: periodic
[tasks](Task) with *bounded execution time* (BET) or *logical execution time*
(LET) semantics, their [job](Job) instances with derived read and data
intervals, and ordered [cause-effect chains](Chain) of communicating tasks.

Response-time bounds for BET tasks are consumed through the
[ResponseTimeOracle] trait; how such bounds are obtained (measurement,
analysis, vendor data sheet) is none of this crate's business.

Before anything is analyzed, a chain is *resolved* against an oracle into a
[ResolvedChain]: an immutable per-analysis view in which every semantic
inconsistency has been rejected and every BET task carries concrete
response-time bounds.
*/

mod chain;
mod job;
mod task;

pub use chain::{Chain, ChainSemantic, ResolvedChain};
pub use job::{Job, JobId};
pub use task::{
    ModelError, NoOracle, ResolvedTask, ResponseTime, ResponseTimeOracle, Semantic, Task, Timing,
};
