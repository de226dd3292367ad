use itertools::Itertools;
use thiserror::Error;

use super::{follows, NodeId, ReachabilityGraph};
use crate::hyperperiod::{self, HyperperiodError};
use crate::model::{ModelError, ResolvedChain};
use crate::time::{div_ceil, Weight};

/// Upper bound on the number of job instances a single reachability graph
/// may contain.
///
/// Chains of tasks with coprime periods can make the hyperperiod, and with
/// it the job count, explode; construction fails with
/// [BuildError::TooManyJobs] instead of allocating a gigantic node set.
pub const MAX_GRAPH_JOBS: usize = 1 << 20;

/// Error type returned when a reachability graph cannot be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The chain or one of its tasks is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// The hyperperiod of the chain's periods cannot be computed.
    #[error("chain {chain}: {source}")]
    Hyperperiod {
        chain: String,
        source: HyperperiodError,
    },
    /// A chain task ended up with no job instance in the analysis window.
    #[error("chain {chain}: task {task} has no job instance within the analysis window")]
    NoJobs { chain: String, task: String },
    /// The job count would exceed [MAX_GRAPH_JOBS] (or the caller-supplied
    /// bound).
    #[error(
        "chain {chain}: the reachability graph would exceed {limit} job instances; \
         the hyperperiod of the task periods is too large for an exact analysis"
    )]
    TooManyJobs { chain: String, limit: usize },
    /// No data can propagate from the first to the last task.
    #[error("chain {chain}: no data can propagate from the first to the last task; the chain is infeasible")]
    Infeasible { chain: String },
}

/// Build the reachability graph of `chain`, bounded by [MAX_GRAPH_JOBS].
pub fn build(chain: ResolvedChain) -> Result<ReachabilityGraph, BuildError> {
    build_bounded(chain, MAX_GRAPH_JOBS)
}

/// Build the reachability graph of `chain`, refusing to instantiate more
/// than `max_jobs` job instances.
///
/// The first task contributes one job per period within the hyperperiod;
/// every later task contributes the jobs that could plausibly consume data
/// from its predecessor. Edges are derived from the [follows] predicate,
/// producers that never received data forward nothing, and edge weights
/// encode the latency change along each hand-over.
pub fn build_bounded(
    chain: ResolvedChain,
    max_jobs: usize,
) -> Result<ReachabilityGraph, BuildError> {
    if chain.tasks.is_empty() {
        return Err(ModelError::EmptyChain { chain: chain.name }.into());
    }
    let hp = hyperperiod::hyperperiod(chain.tasks.iter().map(|t| t.period)).map_err(|source| {
        BuildError::Hyperperiod {
            chain: chain.name.clone(),
            source,
        }
    })?;

    let mut graph = ReachabilityGraph::new(chain, hp);
    instantiate_jobs(&mut graph, max_jobs)?;
    for (producer_layer, consumer_layer) in (0..graph.layers().len()).tuple_windows() {
        connect_layers(&mut graph, producer_layer, consumer_layer);
    }
    assign_weights(&mut graph);

    // Data must be able to enter the chain at the first task and to arrive
    // at the last one; otherwise the chain is infeasible.
    if graph.layers().len() > 1 && (graph.roots().is_empty() || graph.leaves().is_empty()) {
        return Err(BuildError::Infeasible {
            chain: graph.chain().name.clone(),
        });
    }
    Ok(graph)
}

/// Instantiate the job set of every chain task, layer by layer.
fn instantiate_jobs(graph: &mut ReachabilityGraph, max_jobs: usize) -> Result<(), BuildError> {
    let task_count = graph.chain().tasks.len();
    for layer in 0..task_count {
        let task = graph.chain().tasks[layer].clone();
        if layer == 0 {
            // one job per period within the hyperperiod
            let count = (graph.hyperperiod() / task.period) as u64;
            for number in 1..=count {
                if graph.node_count() >= max_jobs {
                    return Err(too_many(graph, max_jobs));
                }
                let job = task.instantiate_job(number);
                graph.add_job(layer, job);
            }
        } else {
            // every job that could plausibly consume data from the
            // predecessor task: read interval starts before the output of
            // the predecessor's last instantiated job expires
            let border = {
                let prev = &graph.layers()[layer - 1];
                match prev.last() {
                    Some(&last) => graph.job(last).dmax,
                    None => 0,
                }
            };
            let mut number = 1;
            loop {
                let job = task.instantiate_job(number);
                if job.rmin >= border {
                    break;
                }
                if graph.node_count() >= max_jobs {
                    return Err(too_many(graph, max_jobs));
                }
                graph.add_job(layer, job);
                number += 1;
            }
        }
        if graph.layers()[layer].is_empty() {
            return Err(BuildError::NoJobs {
                chain: graph.chain().name.clone(),
                task: task.name,
            });
        }
    }
    Ok(())
}

fn too_many(graph: &ReachabilityGraph, limit: usize) -> BuildError {
    BuildError::TooManyJobs {
        chain: graph.chain().name.clone(),
        limit,
    }
}

/// Connect the producers of one layer to the consumers of the next.
fn connect_layers(graph: &mut ReachabilityGraph, producer_layer: usize, consumer_layer: usize) {
    let consumer_task = graph.chain().tasks[consumer_layer].clone();
    let producers = graph.layers()[producer_layer].clone();
    for p in producers {
        // a producer that never received any data cannot forward any
        if producer_layer > 0 && graph.in_degree(p) == 0 {
            continue;
        }
        let producer = graph.job(p).clone();
        // lowest job number of a consumer that may read from this producer
        let lowest = div_ceil(producer.dmin - consumer_task.offset, consumer_task.period) - 1;
        let start = lowest.max(1) as usize;
        let consumers: Vec<NodeId> = graph.layers()[consumer_layer]
            .get(start - 1..)
            .unwrap_or(&[])
            .to_vec();
        for c in consumers {
            let consumer = graph.job(c);
            if consumer.rmin >= producer.dmax {
                // read intervals only move to the right from here on
                break;
            }
            if follows(&producer, consumer) {
                graph.add_edge(p, c);
            }
        }
    }
}

/// Weight every edge with the latency change it contributes.
///
/// For an edge from producer `p` to consumer `c`, the weight is the delay
/// between the instants at which the two jobs' outputs are out,
/// `(Rmin(c) + tail(c)) - (Rmin(p) + tail(p))`, where `tail` is the WCRT of
/// a BET job and λ of a LET job. For producers of the first task the
/// reference point is the activation instant `Rmin(p)` itself, so that path
/// weights accumulate to the full end-to-end latency. Edges into a dead end
/// (a consumer without successors that does not belong to the last task)
/// are weighted `-inf` so that no longest path can use them.
fn assign_weights(graph: &mut ReachabilityGraph) {
    let last_layer = graph.layers().len() - 1;
    for index in 0..graph.edge_count() {
        let edge = super::EdgeId::from(index);
        let (p, c) = graph.edge_endpoints(edge);
        let (p_layer, c_layer) = (graph.layer_of(p), graph.layer_of(c));
        let weight = if graph.out_degree(c) == 0 && c_layer != last_layer {
            Weight::NegInfinity
        } else {
            let reach = graph.job(c).rmin + graph.chain().tasks[c_layer].tail();
            let base = if p_layer == 0 {
                graph.job(p).rmin
            } else {
                graph.job(p).rmin + graph.chain().tasks[p_layer].tail()
            };
            Weight::Finite(reach - base)
        };
        graph.set_weight(edge, weight);
    }
}
