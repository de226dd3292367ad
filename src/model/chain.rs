use std::collections::BTreeMap;

use derive_more::Display;
use itertools::Itertools;

use super::task::{ModelError, ResolvedTask, ResponseTimeOracle, Semantic, Task, Timing};
use crate::time::{Duration, Time};

/// The (mix of) execution semantics found in a chain.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ChainSemantic {
    /// All tasks follow BET semantics.
    #[display(fmt = "BET")]
    Bet,
    /// All tasks follow LET semantics.
    #[display(fmt = "LET")]
    Let,
    /// Both semantics occur; the analysis handles the hand-over per edge.
    #[display(fmt = "mixed BET/LET")]
    Mixed,
}

/// An ordered cause-effect chain of communicating periodic tasks.
///
/// The task sequence is the order in which data propagates: each task reads
/// the output of its predecessor from a shared variable. A chain may carry
/// an end-to-end deadline and, for BET chains handing data over to a
/// successor chain, a transition deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Chain identifier.
    pub name: String,
    /// The tasks, in data-propagation order.
    pub tasks: Vec<Task>,
    /// End-to-end deadline Δ, if declared.
    pub e2e_deadline: Option<Duration>,
    /// Deadline on the hand-over to a successor chain, if declared.
    pub transition_deadline: Option<Duration>,
}

impl Chain {
    /// A chain over the given task sequence, without deadlines.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Chain {
            name: name.into(),
            tasks,
            e2e_deadline: None,
            transition_deadline: None,
        }
    }

    /// Declare an end-to-end deadline Δ.
    pub fn with_e2e_deadline(mut self, deadline: Duration) -> Self {
        self.e2e_deadline = Some(deadline);
        self
    }

    /// Declare a transition deadline for the hand-over to a successor
    /// chain.
    pub fn with_transition_deadline(mut self, deadline: Duration) -> Self {
        self.transition_deadline = Some(deadline);
        self
    }

    /// Classify the chain by the execution semantics of its tasks.
    /// `None` for an empty (invalid) chain.
    pub fn semantic(&self) -> Option<ChainSemantic> {
        let first = self.tasks.first()?.semantic;
        if self.tasks.iter().map(|t| t.semantic).all_equal() {
            Some(match first {
                Semantic::Bet => ChainSemantic::Bet,
                Semantic::Let => ChainSemantic::Let,
            })
        } else {
            Some(ChainSemantic::Mixed)
        }
    }

    /// Reject empty chains and chains containing an invalid task.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.tasks.is_empty() {
            return Err(ModelError::EmptyChain {
                chain: self.name.clone(),
            });
        }
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }
}

/// A chain whose tasks have been bound to the concrete timing parameters
/// of one analysis run.
///
/// This is the immutable view all analyses work on. Chains sharing tasks
/// can be resolved and analyzed concurrently; nothing ever writes back
/// into the task catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    /// Chain identifier.
    pub name: String,
    /// The resolved tasks, in data-propagation order.
    pub tasks: Vec<ResolvedTask>,
    /// End-to-end deadline Δ, if declared.
    pub e2e_deadline: Option<Duration>,
    /// Transition deadline, if declared.
    pub transition_deadline: Option<Duration>,
}

impl ResolvedChain {
    /// Validate `chain` and bind each of its tasks to concrete timing
    /// parameters, consulting `oracle` for missing response-time bounds.
    pub fn resolve<O>(chain: &Chain, oracle: &O) -> Result<Self, ModelError>
    where
        O: ResponseTimeOracle + ?Sized,
    {
        chain.validate()?;
        let tasks = chain
            .tasks
            .iter()
            .map(|task| ResolvedTask::resolve(task, oracle))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedChain {
            name: chain.name.clone(),
            tasks,
            e2e_deadline: chain.e2e_deadline,
            transition_deadline: chain.transition_deadline,
        })
    }

    /// A copy of the chain with each task's WCRT grown by its robustness
    /// margin and each LET task's λ grown by its Δλ.
    ///
    /// This is the inflated view used by margin verification; the original
    /// chain and its tasks are left untouched.
    pub fn inflate(
        &self,
        margins: &BTreeMap<String, Time>,
        delta_let: &BTreeMap<String, Time>,
    ) -> ResolvedChain {
        let tasks = self
            .tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                let margin = margins.get(&task.name).copied().unwrap_or(0);
                let dlet = delta_let.get(&task.name).copied().unwrap_or(0);
                task.timing = match task.timing {
                    Timing::Bet { bcrt, wcrt } => Timing::Bet {
                        bcrt,
                        wcrt: wcrt + margin,
                    },
                    Timing::Let { let_interval, wcrt } => Timing::Let {
                        let_interval: let_interval + dlet,
                        wcrt: wcrt.map(|w| w + margin),
                    },
                };
                task
            })
            .collect();
        ResolvedChain {
            name: self.name.clone(),
            tasks,
            e2e_deadline: self.e2e_deadline,
            transition_deadline: self.transition_deadline,
        }
    }
}
