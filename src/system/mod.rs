/*! System-wide reduction and verification of chain analysis results

A system typically declares several cause-effect chains over a shared task
catalog. Each chain is analyzed on its own
([analyze_chain](crate::chain_analysis::analyze_chain) works on disjoint,
immutable data, so callers may parallelize across chains); this module
reduces the per-chain results to system-wide ones — for each task, the
binding margin is the smallest margin any chain grants it — and re-checks
the reduced margins by re-analyzing every deadline-carrying chain with
inflated parameters.

It also provides the task-level schedulability screen that the chain
analysis assumes: every task has to meet its own deadline before
end-to-end latencies are meaningful.
*/

use std::collections::BTreeMap;

use crate::chain_analysis::{self, AnalysisError, ChainResults};
use crate::model::{Chain, JobId, ResolvedChain, ResponseTimeOracle, Timing};
use crate::time::Time;

/// Aggregated analysis results of all cause-effect chains of one system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemResults {
    /// Maximum end-to-end latency per chain.
    pub chain_latencies: BTreeMap<String, Time>,
    /// System-wide robustness margin per task: the minimum over all chains
    /// the task participates in.
    pub robustness_margins: BTreeMap<String, Time>,
    /// System-wide Δλ per LET task, reduced the same way.
    pub delta_let: BTreeMap<String, Time>,
    /// Consumer slack θ per job, reduced the same way.
    pub job_slack: BTreeMap<JobId, Time>,
    /// The underlying per-chain results, in input order.
    pub chains: Vec<ChainResults>,
}

/// Pointwise-minimum merge of `from` into `into`.
///
/// Keys present in only one map keep their value, shared keys keep the
/// smaller one. Merging a map into itself changes nothing.
pub fn merge_min<K: Ord + Clone>(into: &mut BTreeMap<K, Time>, from: &BTreeMap<K, Time>) {
    for (key, &value) in from {
        into.entry(key.clone())
            .and_modify(|v| *v = (*v).min(value))
            .or_insert(value);
    }
}

/// Analyze every chain of a system and reduce the results.
///
/// Runs the task-level deadline screen first; a task missing its own
/// deadline makes the whole run fail. Chain analyses then run in input
/// order and their margins, Δλ, and slacks are reduced pointwise.
pub fn analyze_system<O>(chains: &[Chain], oracle: &O) -> Result<SystemResults, AnalysisError>
where
    O: ResponseTimeOracle + ?Sized,
{
    for chain in chains {
        check_task_deadlines(chain, oracle)?;
    }
    let mut results = SystemResults::default();
    for chain in chains {
        let chain_results = chain_analysis::analyze_chain(chain, oracle)?;
        results
            .chain_latencies
            .insert(chain_results.chain.clone(), chain_results.max_e2e_latency);
        merge_min(
            &mut results.robustness_margins,
            &chain_results.robustness_margins,
        );
        merge_min(&mut results.delta_let, &chain_results.delta_let);
        merge_min(&mut results.job_slack, &chain_results.job_slack);
        results.chains.push(chain_results);
    }
    Ok(results)
}

/// Check every task of `chain` against its own deadline.
///
/// BET tasks must finish within their (implicit or explicit) deadline
/// relative to their release offset; LET tasks with a known WCRT must
/// finish within λ, except for interconnect tasks, whose λ is not a
/// deadline in that sense.
pub fn check_task_deadlines<O>(chain: &Chain, oracle: &O) -> Result<(), AnalysisError>
where
    O: ResponseTimeOracle + ?Sized,
{
    let resolved = ResolvedChain::resolve(chain, oracle)?;
    for task in &resolved.tasks {
        match task.timing {
            Timing::Bet { wcrt, .. } => {
                let bound = task.deadline.unwrap_or(task.period) - task.offset;
                if wcrt > bound {
                    return Err(AnalysisError::TaskDeadlineViolated {
                        task: task.name.clone(),
                        wcrt,
                        bound,
                    });
                }
            }
            Timing::Let {
                let_interval,
                wcrt: Some(wcrt),
            } if !task.interconnect => {
                if wcrt > let_interval {
                    return Err(AnalysisError::TaskDeadlineViolated {
                        task: task.name.clone(),
                        wcrt,
                        bound: let_interval,
                    });
                }
            }
            Timing::Let { .. } => {}
        }
    }
    Ok(())
}

/// Verify that the system-wide margins are jointly safe: re-analyze every
/// deadline-carrying chain with each task's WCRT grown by its margin and
/// each LET task's λ grown by its Δλ.
///
/// A failure here is not an input problem — the margins were derived to
/// make exactly this check pass — so it indicates a defect in the analysis
/// and is reported as [AnalysisError::MarginVerificationFailed].
pub fn verify_system<O>(
    chains: &[Chain],
    oracle: &O,
    results: &SystemResults,
) -> Result<(), AnalysisError>
where
    O: ResponseTimeOracle + ?Sized,
{
    for chain in chains {
        let deadline = match chain.e2e_deadline {
            Some(deadline) => deadline,
            None => continue,
        };
        let verification = chain_analysis::verify_margins(
            chain,
            oracle,
            &results.robustness_margins,
            &results.delta_let,
        )?;
        if !verification.ok {
            return Err(AnalysisError::MarginVerificationFailed {
                chain: chain.name.clone(),
                latency: verification.new_latency,
                deadline,
            });
        }
    }
    Ok(())
}
