//! Results of a monitor run.

use serde::Serialize;

use crate::config::PredicateBinding;
use crate::detection::Verdict;
use crate::lattice::ProcessPair;
use crate::predicate::PredicateId;

/// How the check of one predicate ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Evaluated(Verdict),
    Failed { error: String },
}

/// Outcome of checking one bound predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateOutcome {
    pub predicate: PredicateId,
    pub pair: ProcessPair,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl PredicateOutcome {
    pub fn evaluated(binding: PredicateBinding, verdict: Verdict) -> Self {
        Self {
            predicate: binding.predicate,
            pair: binding.pair(),
            status: OutcomeStatus::Evaluated(verdict),
        }
    }

    pub fn failed(binding: PredicateBinding, error: impl Into<String>) -> Self {
        Self {
            predicate: binding.predicate,
            pair: binding.pair(),
            status: OutcomeStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.status {
            OutcomeStatus::Evaluated(verdict) => Some(verdict),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// False when the check failed.
    pub fn possibly(&self) -> bool {
        self.verdict().is_some_and(|v| v.possibly)
    }

    /// False when the check failed.
    pub fn definitely(&self) -> bool {
        self.verdict().is_some_and(|v| v.definitely)
    }
}

/// Outcomes of every bound predicate, in binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    outcomes: Vec<PredicateOutcome>,
}

impl DetectionReport {
    pub fn new(outcomes: Vec<PredicateOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[PredicateOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, predicate: PredicateId) -> Option<&PredicateOutcome> {
        self.outcomes.iter().find(|o| o.predicate == predicate)
    }

    /// One flag per predicate id; `false` for predicates not checked.
    pub fn possibly_true(&self) -> Vec<bool> {
        self.flags(PredicateOutcome::possibly)
    }

    /// One flag per predicate id; `false` for predicates not checked.
    pub fn definitely_true(&self) -> Vec<bool> {
        self.flags(PredicateOutcome::definitely)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PredicateOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    fn flags(&self, flag: impl Fn(&PredicateOutcome) -> bool) -> Vec<bool> {
        let mut flags = vec![false; PredicateId::COUNT];
        for outcome in &self.outcomes {
            flags[outcome.predicate.index()] = flag(outcome);
        }
        flags
    }
}
