/*! The data-propagation reachability graph of a cause-effect chain

The nodes of the graph are the job instances of the chain's tasks within one
hyperperiod (plus the over-approximating fringe needed at the chain's tail);
a directed edge connects a producer job to every consumer job that may read
its output, as decided by the [follows] predicate over the jobs' read and
data intervals. Edge weights capture the change in end-to-end latency along
the edge, so the maximum end-to-end latency of the chain is the weight of
the longest root-to-leaf path.

The construction follows the reachability analysis of
[Becker et al. (2016)](https://doi.org/10.1109/RTCSA.2016.41), extended
with release offsets and the per-edge BET/LET hand-over rule.

The graph is a plain arena: nodes and edges live in `Vec`s indexed by
[NodeId] and [EdgeId], and the node set is layered by chain position. The
few required queries (degrees, successors, layered traversal) do not
justify an external graph dependency, and index-based storage keeps every
iteration order deterministic.
*/

use derive_more::{Display, From};

use crate::model::{Job, ResolvedChain};
use crate::time::{Duration, Time, Weight};

mod builder;

pub use builder::{build, build_bounded, BuildError, MAX_GRAPH_JOBS};

/// Index of a node (job instance) in the graph arena.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[display(fmt = "n{}", _0)]
pub struct NodeId(usize);

impl NodeId {
    /// The underlying arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an edge in the graph arena.
#[derive(Debug, Display, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[display(fmt = "e{}", _0)]
pub struct EdgeId(usize);

#[derive(Debug, Clone)]
struct Node {
    job: Job,
    layer: usize,
    in_edges: Vec<EdgeId>,
    out_edges: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
struct Edge {
    source: NodeId,
    target: NodeId,
    weight: Weight,
}

/// The reachability predicate: can consumer job `consumer` read data
/// produced by job `producer`?
///
/// This is Eq. (1) of Becker et al. (2016): the consumer's read interval
/// must end no earlier than the producer's output becomes available, and
/// must start before the producer's output is overwritten.
pub fn follows(producer: &Job, consumer: &Job) -> bool {
    consumer.rmax >= producer.dmin && consumer.rmin < producer.dmax
}

/// The data-propagation graph of one cause-effect chain.
///
/// Owns its node storage and the resolved chain view it was built from.
/// After construction the graph is read-only; both the latency and the
/// robustness-margin analyses only query it.
#[derive(Debug, Clone)]
pub struct ReachabilityGraph {
    chain: ResolvedChain,
    hyperperiod: Duration,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    layers: Vec<Vec<NodeId>>,
}

impl ReachabilityGraph {
    pub(crate) fn new(chain: ResolvedChain, hyperperiod: Duration) -> Self {
        let layers = vec![Vec::new(); chain.tasks.len()];
        ReachabilityGraph {
            chain,
            hyperperiod,
            nodes: Vec::new(),
            edges: Vec::new(),
            layers,
        }
    }

    pub(crate) fn add_job(&mut self, layer: usize, job: Job) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            job,
            layer,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        });
        self.layers[layer].push(id);
        id
    }

    pub(crate) fn add_edge(&mut self, source: NodeId, target: NodeId) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            source,
            target,
            weight: Weight::Finite(0),
        });
        self.nodes[source.0].out_edges.push(id);
        self.nodes[target.0].in_edges.push(id);
        id
    }

    pub(crate) fn set_weight(&mut self, edge: EdgeId, weight: Weight) {
        self.edges[edge.0].weight = weight;
    }

    /// The resolved chain this graph was built for.
    pub fn chain(&self) -> &ResolvedChain {
        &self.chain
    }

    /// The hyperperiod of the chain's task periods.
    pub fn hyperperiod(&self) -> Duration {
        self.hyperperiod
    }

    /// Number of job instances in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of reachability edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The job instance stored at `node`.
    pub fn job(&self, node: NodeId) -> &Job {
        &self.nodes[node.0].job
    }

    /// The chain position of the task owning `node`.
    pub fn layer_of(&self, node: NodeId) -> usize {
        self.nodes[node.0].layer
    }

    /// The node sets of all tasks, in chain order; within a layer, nodes
    /// are ordered by job number.
    pub fn layers(&self) -> &[Vec<NodeId>] {
        &self.layers
    }

    /// Number of producers whose output `node` may read.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.nodes[node.0].in_edges.len()
    }

    /// Number of consumers that may read the output of `node`.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.nodes[node.0].out_edges.len()
    }

    /// The consumer jobs that may read from `node`, in job-number order.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0]
            .out_edges
            .iter()
            .map(move |&e| self.edges[e.0].target)
    }

    /// The producer jobs `node` may read from, in job-number order.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0]
            .in_edges
            .iter()
            .map(move |&e| self.edges[e.0].source)
    }

    /// The outgoing edges of `node` as `(consumer, weight)` pairs.
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
        self.nodes[node.0].out_edges.iter().map(move |&e| {
            let edge = &self.edges[e.0];
            (edge.target, edge.weight)
        })
    }

    /// All edges as `(producer, consumer, weight)` triples, in insertion
    /// order (layer by layer, producers in job-number order).
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, Weight)> + '_ {
        self.edges.iter().map(|e| (e.source, e.target, e.weight))
    }

    /// The endpoints of `edge`.
    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        let e = &self.edges[edge.0];
        (e.source, e.target)
    }

    /// The weight of `edge`.
    pub fn weight(&self, edge: EdgeId) -> Weight {
        self.edges[edge.0].weight
    }

    /// Jobs of the first task at which data may enter the chain: no
    /// predecessor, at least one consumer.
    pub fn roots(&self) -> Vec<NodeId> {
        match self.layers.first() {
            Some(head) => head
                .iter()
                .copied()
                .filter(|&n| self.in_degree(n) == 0 && self.out_degree(n) > 0)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Jobs of the last task at which data leaves the chain: no consumer,
    /// at least one predecessor.
    pub fn leaves(&self) -> Vec<NodeId> {
        match self.layers.last() {
            Some(tail) => tail
                .iter()
                .copied()
                .filter(|&n| self.out_degree(n) == 0 && self.in_degree(n) > 0)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Enumerate every root-to-leaf data-propagation path together with its
    /// accumulated latency.
    ///
    /// Paths crossing a dead-end edge never reach a leaf and are not
    /// reported. The number of paths can grow combinatorially with the
    /// chain length, so this is a diagnostic facility, not the way to
    /// compute the maximum latency — the longest-path pass does that in
    /// O(V+E).
    pub fn root_to_leaf_paths(&self) -> Vec<(Vec<NodeId>, Time)> {
        fn visit(
            graph: &ReachabilityGraph,
            node: NodeId,
            latency: Time,
            trail: &mut Vec<NodeId>,
            out: &mut Vec<(Vec<NodeId>, Time)>,
        ) {
            trail.push(node);
            if graph.layer_of(node) == graph.layers.len() - 1 && graph.out_degree(node) == 0 {
                out.push((trail.clone(), latency));
            }
            for (target, weight) in graph.out_edges(node) {
                if let Weight::Finite(w) = weight {
                    visit(graph, target, latency + w, trail, out);
                }
            }
            trail.pop();
        }

        let mut out = Vec::new();
        let mut trail = Vec::new();
        for root in self.roots() {
            visit(self, root, 0, &mut trail, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests;
