use std::collections::BTreeMap;

use crate::chain_analysis::{analyze_chain, max_e2e_latency, verify_margins, AnalysisError};
use crate::graph::ReachabilityGraph;
use crate::model::{Chain, JobId, NoOracle, ResolvedChain, Task};
use crate::tests::{bet, let_t};
use crate::time::Time;

fn margins_of(map: &BTreeMap<String, Time>, task: &str) -> Time {
    *map.get(task).unwrap_or_else(|| panic!("no entry for {}", task))
}

fn slack_of(map: &BTreeMap<JobId, Time>, task: &str, number: u64) -> Time {
    let id = JobId {
        task: task.to_string(),
        number,
    };
    *map.get(&id).unwrap_or_else(|| panic!("no slack for {}", id))
}

fn two_bet_chain() -> Chain {
    Chain::new("c", vec![bet("t1", 10, 1, 3, 3), bet("t2", 10, 1, 4, 4)])
        .with_e2e_deadline(20)
}

#[test]
fn two_bet_tasks_aligned_periods() {
    let results = analyze_chain(&two_bet_chain(), &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 14);
    assert_eq!(results.effective_deadline, 20);
    assert_eq!(margins_of(&results.robustness_margins, "t1"), 7);
    assert_eq!(margins_of(&results.robustness_margins, "t2"), 6);
    assert!(results.delta_let.is_empty());
    assert_eq!(slack_of(&results.job_slack, "t1", 1), 7);
    // the last task contributes no consumer slack
    assert_eq!(results.job_slack.len(), 1);
}

#[test]
fn two_let_tasks() {
    let chain = Chain::new("c", vec![let_t("t1", 10, 3), let_t("t2", 10, 5)])
        .with_e2e_deadline(20);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 15);
    assert_eq!(margins_of(&results.delta_let, "t1"), 7);
    assert_eq!(margins_of(&results.delta_let, "t2"), 5);
    // without response-time bounds, LET tasks have no WCRT margin
    assert!(results.robustness_margins.is_empty());
}

#[test]
fn mixed_let_head_bet_tail() {
    let chain = Chain::new("c", vec![let_t("t1", 10, 4), bet("t2", 10, 1, 3, 5)])
        .with_e2e_deadline(20);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 15);
    assert_eq!(margins_of(&results.robustness_margins, "t2"), 5);
    assert_eq!(margins_of(&results.delta_let, "t1"), 6);
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
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 34);
    // no declared deadline: the computed latency takes its place
    assert_eq!(results.effective_deadline, 34);
    assert_eq!(margins_of(&results.robustness_margins, "t1"), 8);
    assert_eq!(margins_of(&results.robustness_margins, "t2"), 17);
    assert_eq!(margins_of(&results.robustness_margins, "t3"), 36);
    assert_eq!(slack_of(&results.job_slack, "t1", 1), 8);
    assert_eq!(slack_of(&results.job_slack, "t1", 2), 18);
    assert_eq!(slack_of(&results.job_slack, "t2", 2), 37);
}

#[test]
fn single_bet_task_chain() {
    let chain = Chain::new("c", vec![bet("t", 10, 1, 3, 4)]).with_e2e_deadline(10);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    // no hand-over: the latency is the task's own response-time bound
    assert_eq!(results.max_e2e_latency, 4);
    assert_eq!(margins_of(&results.robustness_margins, "t"), 6);
    assert!(results.job_slack.is_empty());
}

#[test]
fn single_let_task_chain() {
    let chain = Chain::new("c", vec![let_t("t", 10, 3)]);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 3);
    assert_eq!(results.effective_deadline, 3);
    assert_eq!(margins_of(&results.delta_let, "t"), 7);
    assert!(results.robustness_margins.is_empty());
}

#[test]
fn let_task_with_known_wcrt_gets_a_margin() {
    let chain = Chain::new(
        "c",
        vec![Task::let_task("t1", 10, 0, 5).with_response_time(1, 3)],
    );
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(margins_of(&results.robustness_margins, "t1"), 2); // λ - WCRT
    assert_eq!(margins_of(&results.delta_let, "t1"), 5); // P - φ - λ
}

#[test]
fn interconnect_let_skips_period_bound_contributions() {
    let chain = Chain::new(
        "c",
        vec![
            Task::let_task("t1", 10, 0, 25).as_interconnect(),
            let_t("t2", 10, 5),
        ],
    )
    .with_e2e_deadline(50);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 35);
    // λ > P would make P - φ - λ negative; interconnect tasks keep only
    // the consumer slack
    assert_eq!(margins_of(&results.delta_let, "t1"), 5);
    assert_eq!(margins_of(&results.delta_let, "t2"), 5);
}

#[test]
fn explicit_task_deadlines_bound_the_margin() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 3, 3),
            Task::bet("t2", 10, 0, 1, 4)
                .with_response_time(1, 4)
                .with_deadline(8),
        ],
    )
    .with_e2e_deadline(20);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    // t2's own-deadline slack shrinks from P - WCRT = 6 to D - WCRT = 4
    assert_eq!(margins_of(&results.robustness_margins, "t2"), 4);
}

#[test]
fn transition_deadlines_constrain_the_tail_task() {
    let chain = two_bet_chain().with_transition_deadline(14);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    // td - P - WCRT + BCRT = 14 - 10 - 4 + 1 = 1 undercuts both the
    // own-deadline slack and the end-to-end slack
    assert_eq!(margins_of(&results.robustness_margins, "t2"), 1);
    assert_eq!(margins_of(&results.robustness_margins, "t1"), 7);
}

#[test]
fn release_offsets_shift_the_latency() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 3, 3),
            Task::bet("t2", 10, 1, 1, 4).with_response_time(1, 4),
        ],
    )
    .with_e2e_deadline(20);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    // the tail task is released one unit later than in the aligned case
    assert_eq!(results.max_e2e_latency, 15);
}

#[test]
fn latency_beyond_the_deadline_is_fatal() {
    let chain = Chain::new("c", vec![bet("t1", 10, 1, 3, 3), bet("t2", 10, 1, 4, 4)])
        .with_e2e_deadline(10);
    match analyze_chain(&chain, &NoOracle) {
        Err(AnalysisError::DeadlineViolated {
            latency, deadline, ..
        }) => {
            assert_eq!(latency, 14);
            assert_eq!(deadline, 10);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn unconnected_graphs_are_reported_infeasible() {
    // assembled by hand: two single-job layers with no edge between them,
    // so no data ever propagates end to end
    let chain = Chain::new("c", vec![let_t("t1", 10, 3), let_t("t2", 10, 5)]);
    let resolved = ResolvedChain::resolve(&chain, &NoOracle).unwrap();
    let mut graph = ReachabilityGraph::new(resolved, 10);
    let head = graph.chain().tasks[0].clone();
    let tail = graph.chain().tasks[1].clone();
    graph.add_job(0, head.instantiate_job(1));
    graph.add_job(1, tail.instantiate_job(1));
    let err = max_e2e_latency(&graph).unwrap_err();
    assert!(err.is_infeasible());
    assert!(matches!(err, AnalysisError::Infeasible { .. }));
}

#[test]
fn dead_end_paths_do_not_contribute() {
    // the second and fifth job of t2 receive data but feed no t3 job; the
    // only surviving end-to-end path runs through the fourth
    let chain = Chain::new(
        "c",
        vec![let_t("t1", 20, 2), let_t("t2", 10, 5), let_t("t3", 40, 1)],
    );
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(results.max_e2e_latency, 21);
}

#[test]
fn longest_path_matches_exhaustive_path_enumeration() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 2, 2),
            bet("t2", 20, 1, 3, 3),
            bet("t3", 40, 1, 4, 4),
        ],
    );
    let resolved = ResolvedChain::resolve(&chain, &NoOracle).unwrap();
    let graph = crate::graph::build(resolved).unwrap();
    let by_pass = max_e2e_latency(&graph).unwrap();
    let by_enumeration = graph
        .root_to_leaf_paths()
        .into_iter()
        .map(|(_, latency)| latency)
        .max()
        .unwrap();
    assert_eq!(by_pass, by_enumeration);
}

#[test]
fn analysis_is_deterministic() {
    let chain = Chain::new(
        "c",
        vec![
            bet("t1", 10, 1, 2, 2),
            bet("t2", 20, 1, 3, 3),
            bet("t3", 40, 1, 4, 4),
        ],
    );
    let first = analyze_chain(&chain, &NoOracle).unwrap();
    let second = analyze_chain(&chain, &NoOracle).unwrap();
    assert_eq!(first, second);
}

#[test]
fn margins_verify_against_the_deadline() {
    let chain = two_bet_chain();
    let results = analyze_chain(&chain, &NoOracle).unwrap();

    let verification = verify_margins(
        &chain,
        &NoOracle,
        &results.robustness_margins,
        &results.delta_let,
    )
    .unwrap();
    assert!(verification.ok);
    // the margins are tight: they use up the deadline exactly
    assert_eq!(verification.new_latency, 20);
}

#[test]
fn overgrown_margins_fail_verification() {
    let chain = two_bet_chain();
    let results = analyze_chain(&chain, &NoOracle).unwrap();

    let mut too_much = results.robustness_margins.clone();
    too_much.insert("t2".to_string(), margins_of(&results.robustness_margins, "t2") + 1);
    let verification =
        verify_margins(&chain, &NoOracle, &too_much, &results.delta_let).unwrap();
    assert!(!verification.ok);
    assert_eq!(verification.new_latency, 21);
}

#[test]
fn delta_let_verifies_for_let_chains() {
    let chain = Chain::new("c", vec![let_t("t1", 10, 3), let_t("t2", 10, 5)])
        .with_e2e_deadline(20);
    let results = analyze_chain(&chain, &NoOracle).unwrap();
    let verification = verify_margins(
        &chain,
        &NoOracle,
        &results.robustness_margins,
        &results.delta_let,
    )
    .unwrap();
    assert!(verification.ok);
    assert!(verification.new_latency <= 20);
}
