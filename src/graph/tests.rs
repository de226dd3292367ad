use crate::graph::{build, build_bounded, follows, BuildError};
use crate::hyperperiod::HyperperiodError;
use crate::model::{Chain, NoOracle, ResolvedChain, ResolvedTask, Task};
use crate::tests::{bet, let_t};
use crate::time::Weight;

fn resolved(chain: Chain) -> ResolvedChain {
    ResolvedChain::resolve(&chain, &NoOracle).unwrap()
}

fn layer_sizes(graph: &super::ReachabilityGraph) -> Vec<usize> {
    graph.layers().iter().map(|l| l.len()).collect()
}

// Every edge of a graph must satisfy the reachability predicate.
fn assert_follows_on_every_edge(graph: &super::ReachabilityGraph) {
    for (p, c, _) in graph.edges() {
        assert!(
            follows(graph.job(p), graph.job(c)),
            "edge {} -> {} violates the reachability predicate",
            graph.job(p).id(),
            graph.job(c).id()
        );
    }
}

#[test]
fn two_bet_tasks_aligned_periods() {
    let chain = Chain::new("c", vec![bet("t1", 10, 1, 3, 3), bet("t2", 10, 1, 4, 4)]);
    let graph = build(resolved(chain)).unwrap();

    assert_eq!(graph.hyperperiod(), 10);
    assert_eq!(layer_sizes(&graph), vec![1, 2]);
    assert_eq!(graph.edge_count(), 2);
    assert_follows_on_every_edge(&graph);

    let weights: Vec<Weight> = graph.edges().map(|(_, _, w)| w).collect();
    assert_eq!(weights, vec![Weight::Finite(4), Weight::Finite(14)]);

    assert_eq!(graph.roots().len(), 1);
    assert_eq!(graph.leaves().len(), 2);
}

#[test]
fn two_let_tasks() {
    let chain = Chain::new("c", vec![let_t("t1", 10, 3), let_t("t2", 10, 5)]);
    let graph = build(resolved(chain)).unwrap();

    assert_eq!(layer_sizes(&graph), vec![1, 2]);
    assert_follows_on_every_edge(&graph);

    // only the second job of t2 can read the head job's output
    let edges: Vec<_> = graph.edges().collect();
    assert_eq!(edges.len(), 1);
    let (p, c, w) = edges[0];
    assert_eq!(graph.job(p).number, 1);
    assert_eq!(graph.job(c).number, 2);
    assert_eq!(w, Weight::Finite(15));

    // the first job of t2 never receives data and is no leaf
    let orphan = graph.layers()[1][0];
    assert_eq!(graph.in_degree(orphan), 0);
    assert_eq!(graph.leaves().len(), 1);
}

#[test]
fn harmonically_unequal_periods() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 2, 2),
            bet("t2", 20, 1, 3, 3),
            bet("t3", 40, 1, 4, 4),
        ],
    );
    let graph = build(resolved(chain)).unwrap();

    assert_eq!(graph.hyperperiod(), 40);
    // one job per period for the head task; the later rows stretch past
    // the hyperperiod to cover the last producer's data interval
    assert_eq!(layer_sizes(&graph), vec![4, 3, 2]);
    assert_eq!(graph.edge_count(), 7);
    assert_follows_on_every_edge(&graph);
    assert_eq!(graph.roots().len(), 4);
    assert_eq!(graph.leaves().len(), 2);
}

#[test]
fn producers_without_input_forward_nothing() {
    let chain = Chain::new(
        "c",
        vec![let_t("t1", 10, 3), let_t("t2", 10, 5), let_t("t3", 10, 2)],
    );
    let graph = build(resolved(chain)).unwrap();

    // t2's first job cannot read from t1, so it must not feed t3 either,
    // even though its data interval overlaps t3's read intervals
    let orphan = graph.layers()[1][0];
    assert_eq!(graph.in_degree(orphan), 0);
    assert_eq!(graph.out_degree(orphan), 0);

    // the connected t2 job hands over to t3's third job
    let connected = graph.layers()[1][1];
    assert_eq!(graph.in_degree(connected), 1);
    let successors: Vec<_> = graph
        .successors(connected)
        .map(|s| graph.job(s).number)
        .collect();
    assert_eq!(successors, vec![3]);
    assert_follows_on_every_edge(&graph);
}

#[test]
fn dead_end_edges_are_weighted_negative_infinity() {
    let chain = Chain::new(
        "c",
        vec![let_t("t1", 20, 2), let_t("t2", 10, 5), let_t("t3", 40, 1)],
    );
    let graph = build(resolved(chain)).unwrap();
    assert_eq!(layer_sizes(&graph), vec![2, 5, 2]);

    // t2 jobs 2 and 3 receive data from the first head job but no t3 job
    // can ever read from them; the edges into them are unusable
    let mut finite = 0;
    let mut dead = 0;
    for (_, c, w) in graph.edges() {
        if w.is_finite() {
            finite += 1;
        } else {
            dead += 1;
            assert_ne!(graph.layer_of(c), graph.layers().len() - 1);
            assert_eq!(graph.out_degree(c), 0);
        }
    }
    assert_eq!(dead, 3);
    assert_eq!(finite, 2);
    assert_follows_on_every_edge(&graph);
}

#[test]
fn path_enumeration_reports_every_end_to_end_path() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 2, 2),
            bet("t2", 20, 1, 3, 3),
            bet("t3", 40, 1, 4, 4),
        ],
    );
    let graph = build(resolved(chain)).unwrap();
    let paths = graph.root_to_leaf_paths();
    assert_eq!(paths.len(), 4);
    for (trail, _) in &paths {
        // every path runs through all three layers
        assert_eq!(trail.len(), 3);
        assert_eq!(graph.layer_of(trail[0]), 0);
        assert_eq!(graph.layer_of(trail[2]), 2);
    }
    assert_eq!(paths.iter().map(|(_, l)| *l).max(), Some(34));
}

#[test]
fn graphs_build_deterministically() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 2, 2),
            bet("t2", 20, 1, 3, 3),
            bet("t3", 40, 1, 4, 4),
        ],
    );
    let a = build(resolved(chain.clone())).unwrap();
    let b = build(resolved(chain)).unwrap();
    assert_eq!(a.layers(), b.layers());
    assert_eq!(
        a.edges().collect::<Vec<_>>(),
        b.edges().collect::<Vec<_>>()
    );
}

#[test]
fn job_count_is_bounded() {
    let chain = Chain::new("c", vec![bet("t1", 10, 1, 3, 3), bet("t2", 10, 1, 4, 4)]);
    assert!(matches!(
        build_bounded(resolved(chain), 2),
        Err(BuildError::TooManyJobs { limit: 2, .. })
    ));
}

#[test]
fn hyperperiod_overflow_fails_the_build() {
    let chain = Chain::new(
        "c",
        vec![
            let_t("t1", 4_000_000_007, 5),
            let_t("t2", 4_000_000_009, 5),
        ],
    );
    assert!(matches!(
        build(resolved(chain)),
        Err(BuildError::Hyperperiod {
            source: HyperperiodError::Overflow { .. },
            ..
        })
    ));
}

#[test]
fn follows_matches_the_interval_predicate() {
    let producer_task = ResolvedTask::resolve(&let_t("a", 10, 3), &NoOracle).unwrap();
    let producer = producer_task.instantiate_job(1);
    // producer data interval: [3, 13)
    let consumer_task = ResolvedTask::resolve(&let_t("b", 10, 5), &NoOracle).unwrap();
    let too_early = consumer_task.instantiate_job(1); // reads at 0
    let in_time = consumer_task.instantiate_job(2); // reads at 10
    let too_late = consumer_task.instantiate_job(3); // reads at 20
    assert!(!follows(&producer, &too_early));
    assert!(follows(&producer, &in_time));
    assert!(!follows(&producer, &too_late));
}

#[test]
fn offsets_shift_the_edge_structure() {
    // same chain as two_bet_tasks_aligned_periods, but the consumer is
    // released one unit later; the edge weights pick up the offset
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 3, 3),
            Task::bet("t2", 10, 1, 1, 4).with_response_time(1, 4),
        ],
    );
    let graph = build(resolved(chain)).unwrap();
    assert_follows_on_every_edge(&graph);
    let weights: Vec<Weight> = graph.edges().map(|(_, _, w)| w).collect();
    assert_eq!(weights, vec![Weight::Finite(5), Weight::Finite(15)]);
}
