use std::collections::BTreeMap;

use super::AnalysisError;
use crate::graph::{NodeId, ReachabilityGraph};
use crate::model::{JobId, ResolvedTask, Timing};
use crate::time::{div_ceil, Time};

/// The robustness results of one chain: per-task margins, per-LET-task Δλ,
/// and per-job consumer slack θ.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainMargins {
    /// Largest safe WCRT increase per task. Tasks that contribute no
    /// candidate (LET tasks without a known WCRT) have no entry.
    pub robustness_margins: BTreeMap<String, Time>,
    /// Largest safe λ increase per LET task.
    pub delta_let: BTreeMap<String, Time>,
    /// Consumer slack θ per job.
    pub job_slack: BTreeMap<JobId, Time>,
}

/// Derive the robustness margins of every chain task from the reachability
/// graph and the previously computed maximum end-to-end latency.
///
/// For each job of a task, up to three candidate slacks apply:
///
/// - the slack against the task's own deadline (BET: `D - φ - WCRT` with
///   `D` defaulting to the period; LET: `λ - WCRT` when the WCRT is known,
///   and `P - φ - λ` unless the task is an interconnect task);
/// - for jobs of every task but the last, the consumer slack θ: the gap
///   between the job's data interval and the read interval of the first
///   consumer job that must remain unable to read from it;
/// - for jobs of the last task, the end-to-end slack `Δ - latency` (when a
///   deadline is declared) and, for BET tasks, the transition-deadline
///   slack `td - P - WCRT + BCRT` (when a transition deadline is
///   declared).
///
/// Per task, negative candidates are dropped and the minimum of the rest
/// is taken (zero if nothing non-negative remains). BET candidates feed
/// the robustness margin, LET candidates feed Δλ, except that `λ - WCRT`
/// bounds the WCRT of a LET task and therefore feeds its margin.
pub fn calculate_robustness_margins(
    graph: &ReachabilityGraph,
    max_latency: Time,
) -> Result<ChainMargins, AnalysisError> {
    let chain = graph.chain();
    let last = chain.tasks.len() - 1;
    let mut margin_candidates: Vec<Vec<Time>> = vec![Vec::new(); chain.tasks.len()];
    let mut dlet_candidates: Vec<Vec<Time>> = vec![Vec::new(); chain.tasks.len()];
    let mut job_slack: BTreeMap<JobId, Time> = BTreeMap::new();

    for (k, layer) in graph.layers().iter().enumerate() {
        let task = &chain.tasks[k];
        for &node in layer {
            // jobs that never receive data do not constrain the chain
            if k > 0 && graph.in_degree(node) == 0 {
                continue;
            }

            // slack against the task's own deadline
            match task.timing {
                Timing::Bet { wcrt, .. } => {
                    let deadline = task.deadline.unwrap_or(task.period);
                    margin_candidates[k].push(deadline - task.offset - wcrt);
                }
                Timing::Let { let_interval, wcrt } => {
                    if let Some(wcrt) = wcrt {
                        margin_candidates[k].push(let_interval - wcrt);
                    }
                    // an interconnect task's λ may exceed its period, so
                    // period-bound slack does not apply to it
                    if !task.interconnect {
                        dlet_candidates[k].push(task.period - task.offset - let_interval);
                    }
                }
            }

            if k < last {
                // consumer slack θ
                let theta = consumer_slack(graph, node, &chain.tasks[k + 1])?;
                job_slack
                    .entry(graph.job(node).id())
                    .and_modify(|slack| *slack = (*slack).min(theta))
                    .or_insert(theta);
                match task.timing {
                    Timing::Bet { .. } => margin_candidates[k].push(theta),
                    Timing::Let { .. } => dlet_candidates[k].push(theta),
                }
            } else {
                // slack against the chain's deadlines
                if let Some(deadline) = chain.e2e_deadline {
                    match task.timing {
                        Timing::Bet { .. } => margin_candidates[k].push(deadline - max_latency),
                        Timing::Let { .. } => dlet_candidates[k].push(deadline - max_latency),
                    }
                }
                if let Timing::Bet { bcrt, wcrt } = task.timing {
                    if let Some(transition) = chain.transition_deadline {
                        margin_candidates[k].push(transition - task.period - wcrt + bcrt);
                    }
                }
            }
        }
    }

    let mut margins = ChainMargins {
        job_slack,
        ..ChainMargins::default()
    };
    for (k, task) in chain.tasks.iter().enumerate() {
        if let Some(margin) = aggregate(&margin_candidates[k]) {
            margins.robustness_margins.insert(task.name.clone(), margin);
        }
        if let Some(dlet) = aggregate(&dlet_candidates[k]) {
            margins.delta_let.insert(task.name.clone(), dlet);
        }
    }
    Ok(margins)
}

/// Reduce a candidate list to a single margin: negative candidates are
/// unattainable and dropped; if nothing non-negative remains the margin is
/// zero. `None` when there was no candidate at all.
fn aggregate(candidates: &[Time]) -> Option<Time> {
    if candidates.is_empty() {
        return None;
    }
    candidates
        .iter()
        .copied()
        .filter(|&c| c >= 0)
        .min()
        .or(Some(0))
}

/// The largest amount θ by which the data interval of the job at `node`
/// may grow before a consumer job that currently cannot read from it
/// becomes able to.
///
/// If the job has successors in the graph, the first job beyond the
/// highest successor index is the one that must stay out of reach;
/// otherwise the first consumer job whose read interval starts strictly
/// after the producer's data interval is searched directly. Either way the
/// boundary job is instantiated on demand (job construction is pure, so
/// this agrees with whatever the graph holds).
fn consumer_slack(
    graph: &ReachabilityGraph,
    node: NodeId,
    consumer_task: &ResolvedTask,
) -> Result<Time, AnalysisError> {
    let job = graph.job(node);
    let highest = graph.successors(node).map(|s| graph.job(s).number).max();
    let boundary = match highest {
        Some(number) => consumer_task.instantiate_job(number + 1),
        None => {
            let mut number =
                div_ceil(job.dmin - consumer_task.offset, consumer_task.period).max(1);
            loop {
                let candidate = consumer_task.instantiate_job(number as u64);
                if candidate.rmin > job.dmax {
                    break candidate;
                }
                number += 1;
            }
        }
    };
    let theta = boundary.rmin - job.dmax;
    if theta < 0 {
        return Err(AnalysisError::NegativeSlack {
            chain: graph.chain().name.clone(),
            job: job.id(),
            theta,
        });
    }
    Ok(theta)
}
