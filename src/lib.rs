/*!
# Latency & Robustness Analysis for Cause-Effect Chains

This crate collects definitions and algorithms for bounding the maximum
end-to-end data-propagation latency of real-time *cause-effect chains* —
sequences of periodic tasks communicating through shared variables — and
for deriving per-task *robustness margins*: how much each task's worst-case
response time (or logical execution time) may grow before any chain-level
or task-level deadline breaks.

## Scope

The crate does *not* provide a ready-made tool itself: it knows no input
format, prints nothing, and computes no response times of its own (those
are consumed through the [ResponseTimeOracle](model::ResponseTimeOracle)
trait). Rather, it is the analytical core on top of which such tooling may
be built. Both *bounded execution time* (BET) and *logical execution time*
(LET) tasks are supported, including chains mixing the two.

## Citations

The latency analysis implements the reachability-graph approach of the
following papers, extended with release offsets and a per-edge BET/LET
hand-over rule. Please cite them when using this crate for academic work:

- M. Becker, D. Dasari, S. Mubeen, M. Behnam, and T. Nolte, “Synthesizing
  Job-Level Dependencies for Automotive Multi-rate Effect Chains”,
  *Proceedings of the 22nd IEEE International Conference on Embedded and
  Real-Time Computing Systems and Applications (RTCSA 2016)*, pp. 159--169,
  August 2016.
- M. Becker, D. Dasari, S. Mubeen, M. Behnam, and T. Nolte, “End-to-end
  timing analysis of cause-effect chains in automotive embedded systems”,
  *Journal of Systems Architecture*, vol. 80, pp. 104--113, October 2017.

*/

pub mod chain_analysis;
pub mod graph;
pub mod hyperperiod;
pub mod model;
pub mod system;
pub mod time;
