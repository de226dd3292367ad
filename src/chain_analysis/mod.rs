/*! Per-chain latency and robustness analyses

Given a cause-effect chain and response-time bounds for its BET tasks, this
module computes

1. an upper bound on the maximum end-to-end data-propagation latency of the
   chain, as the longest root-to-leaf path in the chain's
   [reachability graph](crate::graph) (Becker et al., 2016/2017), and
2. per-task *robustness margins*: the largest amount by which each task's
   WCRT (or, for LET tasks, λ) may grow without violating any chain-level
   or task-level deadline.

[analyze_chain] runs the whole pipeline; [verify_margins] re-runs the
latency analysis with the computed margins applied to a copy of the chain,
which must never push the latency beyond the deadline.
*/

use std::collections::BTreeMap;

use thiserror::Error;

use crate::graph::{self, BuildError};
use crate::model::{Chain, JobId, ModelError, ResolvedChain, ResponseTimeOracle};
use crate::time::{Duration, Time};

mod latency;
mod margins;

pub use latency::max_e2e_latency;
pub use margins::{calculate_robustness_margins, ChainMargins};

/// Error type covering everything that can go wrong while analyzing a
/// chain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The chain or one of its tasks is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The reachability graph could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// No root-to-leaf path exists; the chain never propagates data end to
    /// end.
    #[error(
        "chain {chain}: no data propagation path connects the first and the last task; \
         the chain is infeasible"
    )]
    Infeasible { chain: String },
    /// The computed latency exceeds the declared end-to-end deadline; the
    /// input system is unsafe.
    #[error("chain {chain}: end-to-end latency {latency} exceeds the declared deadline {deadline}")]
    DeadlineViolated {
        chain: String,
        latency: Time,
        deadline: Duration,
    },
    /// A consumer slack came out negative, which the analysis guarantees
    /// not to happen.
    #[error("chain {chain}: job {job} has negative consumer slack {theta}")]
    NegativeSlack {
        chain: String,
        job: JobId,
        theta: Time,
    },
    /// Re-analysis with inflated parameters broke the deadline; the
    /// margins were not jointly safe.
    #[error(
        "chain {chain}: applying the computed margins raises the end-to-end latency \
         to {latency}, beyond the deadline {deadline}"
    )]
    MarginVerificationFailed {
        chain: String,
        latency: Time,
        deadline: Duration,
    },
    /// A task misses its own deadline; the chain analysis assumes
    /// task-level schedulability.
    #[error("task {task}: worst-case response time {wcrt} exceeds its deadline bound {bound}")]
    TaskDeadlineViolated {
        task: String,
        wcrt: Duration,
        bound: Duration,
    },
}

impl AnalysisError {
    /// Is this an infeasibility report, as opposed to invalid input, a
    /// deadline violation, or an internal invariant breach?
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            AnalysisError::Infeasible { .. }
                | AnalysisError::Build(BuildError::Infeasible { .. })
        )
    }
}

/// The complete analysis result of one cause-effect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResults {
    /// Chain identifier.
    pub chain: String,
    /// Upper bound on the maximum end-to-end data-propagation latency.
    pub max_e2e_latency: Time,
    /// The declared end-to-end deadline Δ, or the computed latency if the
    /// chain declared none.
    pub effective_deadline: Duration,
    /// Largest safe WCRT increase per task.
    pub robustness_margins: BTreeMap<String, Time>,
    /// Largest safe λ increase per LET task.
    pub delta_let: BTreeMap<String, Time>,
    /// Consumer slack θ per job.
    pub job_slack: BTreeMap<JobId, Time>,
}

/// Outcome of re-analyzing a chain with inflated timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginVerification {
    /// Did the inflated chain stay within its end-to-end deadline?
    pub ok: bool,
    /// End-to-end latency of the inflated chain.
    pub new_latency: Time,
}

/// Analyze one cause-effect chain: resolve it against `oracle`, build its
/// reachability graph, bound the end-to-end latency, and derive the
/// robustness margins.
///
/// The result is a deterministic function of the chain, the oracle, and
/// nothing else; analyzing the same chain twice yields identical results.
pub fn analyze_chain<O>(chain: &Chain, oracle: &O) -> Result<ChainResults, AnalysisError>
where
    O: ResponseTimeOracle + ?Sized,
{
    let resolved = ResolvedChain::resolve(chain, oracle)?;
    analyze_resolved(resolved)
}

/// Analyze a chain that has already been resolved.
pub fn analyze_resolved(chain: ResolvedChain) -> Result<ChainResults, AnalysisError> {
    let declared_deadline = chain.e2e_deadline;
    let graph = graph::build(chain)?;
    let latency = max_e2e_latency(&graph)?;
    if let Some(deadline) = declared_deadline {
        if latency > deadline {
            return Err(AnalysisError::DeadlineViolated {
                chain: graph.chain().name.clone(),
                latency,
                deadline,
            });
        }
    }
    let margins = calculate_robustness_margins(&graph, latency)?;
    Ok(ChainResults {
        chain: graph.chain().name.clone(),
        max_e2e_latency: latency,
        effective_deadline: declared_deadline.unwrap_or(latency),
        robustness_margins: margins.robustness_margins,
        delta_let: margins.delta_let,
        job_slack: margins.job_slack,
    })
}

/// Re-run the latency analysis with every task's WCRT grown by its margin
/// and every LET task's λ grown by its Δλ, and check the result against
/// the chain's end-to-end deadline.
///
/// The inflation is applied to a copy of the resolved chain; the caller's
/// tasks are never touched, so chains sharing tasks can be verified
/// concurrently. A chain without a declared deadline has no chain-level
/// bound to re-check and verifies vacuously.
pub fn verify_margins<O>(
    chain: &Chain,
    oracle: &O,
    margins: &BTreeMap<String, Time>,
    delta_let: &BTreeMap<String, Time>,
) -> Result<MarginVerification, AnalysisError>
where
    O: ResponseTimeOracle + ?Sized,
{
    let resolved = ResolvedChain::resolve(chain, oracle)?;
    let inflated = resolved.inflate(margins, delta_let);
    let graph = graph::build(inflated)?;
    let new_latency = max_e2e_latency(&graph)?;
    let ok = match chain.e2e_deadline {
        Some(deadline) => new_latency <= deadline,
        None => true,
    };
    Ok(MarginVerification { ok, new_latency })
}

#[cfg(test)]
mod tests;
