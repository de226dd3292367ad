use super::AnalysisError;
use crate::graph::ReachabilityGraph;
use crate::time::{Time, Weight};

#[cfg(debug_assertions)]
use crate::graph::NodeId;

/// Bound the maximum end-to-end latency of the chain: the weight of the
/// longest root-to-leaf path in its reachability graph.
///
/// The graph is layered by chain position and every edge connects adjacent
/// layers, so iterating the layers in chain order visits the nodes in a
/// topological order; a single relaxation pass per edge suffices even
/// though weights may be negative. Edges weighted `-inf` (dead ends) are
/// absorbed by [Weight::NegInfinity] and can never carry a path to a leaf.
///
/// Fails with [AnalysisError::Infeasible] when no root-to-leaf path
/// exists; an infeasible chain is never reported as having zero latency.
pub fn max_e2e_latency(graph: &ReachabilityGraph) -> Result<Time, AnalysisError> {
    // A single-task chain has no hand-over: the latency is the delay from
    // activation to output of any one job.
    if graph.layers().len() == 1 {
        return Ok(graph.chain().tasks[0].tail());
    }

    let roots = graph.roots();
    let leaves = graph.leaves();
    if roots.is_empty() || leaves.is_empty() {
        return Err(infeasible(graph));
    }

    let mut dist = vec![Weight::NegInfinity; graph.node_count()];
    for &root in &roots {
        dist[root.index()] = Weight::Finite(0);
    }
    for layer in graph.layers() {
        for &node in layer {
            let from = dist[node.index()];
            if !from.is_finite() {
                continue;
            }
            for (target, weight) in graph.out_edges(node) {
                let candidate = from + weight;
                if candidate > dist[target.index()] {
                    dist[target.index()] = candidate;
                }
            }
        }
    }

    let best = leaves
        .iter()
        .filter_map(|leaf| dist[leaf.index()].finite())
        .max();
    match best {
        Some(latency) => {
            // In debug mode, compare against the brute-force solution.
            #[cfg(debug_assertions)]
            debug_assert_eq!(brute_force_longest_path(graph), Some(latency));
            Ok(latency)
        }
        None => Err(infeasible(graph)),
    }
}

fn infeasible(graph: &ReachabilityGraph) -> AnalysisError {
    AnalysisError::Infeasible {
        chain: graph.chain().name.clone(),
    }
}

/// Very slow, naive enumeration of all root-to-leaf paths. Only used to
/// cross-check the layered pass in debug builds.
#[cfg(debug_assertions)]
fn brute_force_longest_path(graph: &ReachabilityGraph) -> Option<Time> {
    fn visit(
        graph: &ReachabilityGraph,
        node: NodeId,
        acc: Time,
        last_layer: usize,
        best: &mut Option<Time>,
    ) {
        if graph.layer_of(node) == last_layer && graph.out_degree(node) == 0 {
            *best = Some(match *best {
                Some(b) => b.max(acc),
                None => acc,
            });
        }
        for (target, weight) in graph.out_edges(node) {
            // paths across dead-end edges do not reach any leaf
            if let Weight::Finite(w) = weight {
                visit(graph, target, acc + w, last_layer, best);
            }
        }
    }

    let last_layer = graph.layers().len() - 1;
    let mut best = None;
    for root in graph.roots() {
        visit(graph, root, 0, last_layer, &mut best);
    }
    best
}
