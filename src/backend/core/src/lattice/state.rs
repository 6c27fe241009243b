//! Lattice node and process-pair types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::ProcessId;

/// One event index per process.
///
/// Component `p` is the index of the latest event of process `p` included
/// in the state. The initial state is all zeros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalState(Vec<usize>);

impl GlobalState {
    /// The all-zero state for `process_count` processes.
    pub fn initial(process_count: usize) -> Self {
        Self(vec![0; process_count])
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of components (the process count).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Event index of `process` in this state.
    ///
    /// # Panics
    ///
    /// Panics if `process` is out of range.
    pub fn index_of(&self, process: ProcessId) -> usize {
        self.0[process.index()]
    }

    /// A copy with `process` advanced by one event.
    pub fn advanced(&self, process: ProcessId) -> Self {
        let mut next = self.0.clone();
        next[process.index()] += 1;
        Self(next)
    }

    /// Whether `self` is an immediate successor of `other`: exactly one
    /// component is larger by exactly one and all others are equal.
    pub fn is_successor_of(&self, other: &GlobalState) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        let mut advanced = 0;
        for (mine, theirs) in self.0.iter().zip(&other.0) {
            if *mine == *theirs + 1 {
                advanced += 1;
            } else if mine != theirs {
                return false;
            }
        }
        advanced == 1
    }
}

impl fmt::Display for GlobalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S(")?;
        for (n, index) in self.0.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, ")")
    }
}

/// The two distinct processes a predicate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessPair {
    i: ProcessId,
    j: ProcessId,
}

impl ProcessPair {
    /// # Panics
    ///
    /// Panics if `i == j`.
    pub fn new(i: ProcessId, j: ProcessId) -> Self {
        assert_ne!(i, j, "a process pair needs two distinct processes");
        Self { i, j }
    }

    pub fn i(&self) -> ProcessId {
        self.i
    }

    pub fn j(&self) -> ProcessId {
        self.j
    }

    pub fn processes(&self) -> [ProcessId; 2] {
        [self.i, self.j]
    }

    /// Whether both processes exist in a run of `process_count` processes.
    pub fn fits(&self, process_count: usize) -> bool {
        self.i.index() < process_count && self.j.index() < process_count
    }
}

impl fmt::Display for ProcessPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_relation() {
        let s00 = GlobalState::from_indices(vec![0, 0]);
        let s10 = GlobalState::from_indices(vec![1, 0]);
        let s11 = GlobalState::from_indices(vec![1, 1]);
        let s20 = GlobalState::from_indices(vec![2, 0]);

        assert!(s10.is_successor_of(&s00));
        assert!(s11.is_successor_of(&s10));
        assert!(!s11.is_successor_of(&s00));
        assert!(!s20.is_successor_of(&s00));
        assert!(!s00.is_successor_of(&s00));
        assert!(!s00.is_successor_of(&s10));
    }

    #[test]
    fn test_advanced() {
        let s = GlobalState::initial(3).advanced(ProcessId(2));
        assert_eq!(s.indices(), &[0, 0, 1]);
        assert_eq!(s.index_of(ProcessId(2)), 1);
        assert_eq!(s.to_string(), "S(0,0,1)");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut states = vec![
            GlobalState::from_indices(vec![1, 0]),
            GlobalState::from_indices(vec![0, 1]),
            GlobalState::from_indices(vec![0, 0]),
        ];
        states.sort();
        assert_eq!(states[0], GlobalState::initial(2));
        assert_eq!(states[2].indices(), &[1, 0]);
    }

    #[test]
    #[should_panic(expected = "distinct")]
    fn test_pair_rejects_same_process() {
        ProcessPair::new(ProcessId(1), ProcessId(1));
    }

    #[test]
    fn test_pair_fits() {
        let pair = ProcessPair::new(ProcessId(0), ProcessId(2));
        assert!(pair.fits(3));
        assert!(!pair.fits(2));
        assert_eq!(pair.to_string(), "(P0, P2)");
    }
}
