//! Predicates over the local states of two processes.
//!
//! The set of predicates is closed: [`PredicateId`] names four slots, each
//! bound by default to a fixed process pair. The functions themselves are
//! supplied by the caller through a [`PredicateTable`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::ProcessId;
use crate::error::CutlineError;
use crate::lattice::ProcessPair;

/// Identifier of one of the four predicate slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PredicateId {
    P0,
    P1,
    P2,
    P3,
}

impl PredicateId {
    pub const COUNT: usize = 4;

    pub const ALL: [PredicateId; Self::COUNT] = [Self::P0, Self::P1, Self::P2, Self::P3];

    pub const fn index(self) -> usize {
        match self {
            Self::P0 => 0,
            Self::P1 => 1,
            Self::P2 => 2,
            Self::P3 => 3,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::P0),
            1 => Some(Self::P1),
            2 => Some(Self::P2),
            3 => Some(Self::P3),
            _ => None,
        }
    }

    /// The process pair this predicate reads unless configured otherwise:
    /// predicates 0-2 read processes 0 and 1, predicate 3 reads 0 and 2.
    pub fn default_pair(self) -> ProcessPair {
        match self {
            Self::P0 | Self::P1 | Self::P2 => ProcessPair::new(ProcessId(0), ProcessId(1)),
            Self::P3 => ProcessPair::new(ProcessId(0), ProcessId(2)),
        }
    }
}

impl TryFrom<usize> for PredicateId {
    type Error = CutlineError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or_else(|| CutlineError::unknown_predicate(index))
    }
}

impl From<PredicateId> for usize {
    fn from(id: PredicateId) -> Self {
        id.index()
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "predicate{}", self.index())
    }
}

/// A pure, total boolean function of two local states.
pub trait Predicate<S>: Send + Sync {
    /// Evaluate on the local state of process `i` and of process `j`.
    fn holds(&self, local_i: &S, local_j: &S) -> bool;
}

impl<S, F> Predicate<S> for F
where
    F: Fn(&S, &S) -> bool + Send + Sync,
{
    fn holds(&self, local_i: &S, local_j: &S) -> bool {
        self(local_i, local_j)
    }
}

/// The predicate registered for each [`PredicateId`], if any.
pub struct PredicateTable<S> {
    slots: [Option<Box<dyn Predicate<S>>>; PredicateId::COUNT],
}

impl<S> PredicateTable<S> {
    pub fn new() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }

    /// Register `predicate` under `id`, replacing any previous one.
    pub fn register(&mut self, id: PredicateId, predicate: impl Predicate<S> + 'static) {
        self.slots[id.index()] = Some(Box::new(predicate));
    }

    /// Builder form of [`PredicateTable::register`].
    pub fn with(mut self, id: PredicateId, predicate: impl Predicate<S> + 'static) -> Self {
        self.register(id, predicate);
        self
    }

    pub fn get(&self, id: PredicateId) -> Option<&dyn Predicate<S>> {
        self.slots[id.index()].as_deref()
    }

    pub fn is_registered(&self, id: PredicateId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Ids with a registered predicate, in ascending order.
    pub fn registered(&self) -> Vec<PredicateId> {
        PredicateId::ALL
            .into_iter()
            .filter(|id| self.is_registered(*id))
            .collect()
    }
}

impl<S> Default for PredicateTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for PredicateTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateTable")
            .field("registered", &self.registered())
            .finish()
    }
}
