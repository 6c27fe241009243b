//! Possibly / definitely evaluation of a two-process predicate over a lattice.
//!
//! Both checks are forward breadth-first traversals from the initial state.
//! Frontiers are ordered sets keyed by state, so a state reachable along
//! several paths is expanded once per level.
//!
//! - **possibly**: some reachable consistent state satisfies the predicate.
//! - **definitely**: every path from the initial state to a sink passes
//!   through a state that satisfies the predicate.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use crate::events::EventLog;
use crate::lattice::{GlobalState, Lattice};
use crate::predicate::Predicate;

/// Result of evaluating one predicate over one lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// The predicate held in at least one reachable consistent state
    pub possibly: bool,
    /// The predicate held somewhere on every maximal path
    pub definitely: bool,
    /// First state (in breadth-first order) where the predicate held
    pub witness: Option<GlobalState>,
    /// Lattice levels visited by the possibly traversal
    pub rounds: usize,
}

/// Evaluates predicates over one lattice and the logs it was built from.
#[derive(Debug)]
pub struct PredicateEvaluator<'a, S> {
    lattice: &'a Lattice,
    logs: &'a [EventLog<S>],
}

impl<'a, S> PredicateEvaluator<'a, S> {
    /// # Panics
    ///
    /// Panics if `logs` does not cover the lattice's process pair.
    pub fn new(lattice: &'a Lattice, logs: &'a [EventLog<S>]) -> Self {
        assert!(
            lattice.pair().fits(logs.len()),
            "logs for {} processes do not cover pair {}",
            logs.len(),
            lattice.pair()
        );
        Self { lattice, logs }
    }

    /// Run both traversals.
    #[instrument(skip_all, fields(pair = %self.lattice.pair(), states = self.lattice.len()))]
    pub fn evaluate<P>(&self, predicate: &P) -> Verdict
    where
        P: Predicate<S> + ?Sized,
    {
        let (witness, rounds) = self.possibly(predicate);
        let definitely = self.definitely(predicate);

        debug!(
            possibly = witness.is_some(),
            definitely,
            rounds,
            "Predicate evaluated"
        );

        Verdict {
            possibly: witness.is_some(),
            definitely,
            witness,
            rounds,
        }
    }

    /// Search level by level for a state where the predicate holds.
    ///
    /// Returns the first such state and the number of levels visited.
    pub fn possibly<P>(&self, predicate: &P) -> (Option<GlobalState>, usize)
    where
        P: Predicate<S> + ?Sized,
    {
        let mut frontier = BTreeSet::from([self.lattice.initial().clone()]);
        let mut rounds = 0;

        while !frontier.is_empty() {
            rounds += 1;

            if let Some(state) = frontier.iter().find(|s| self.holds_at(predicate, s)) {
                return (Some(state.clone()), rounds);
            }

            frontier = frontier
                .iter()
                .flat_map(|s| self.lattice.find_reachable_states(s))
                .collect();
        }

        (None, rounds)
    }

    /// Search for a path from the initial state to a sink on which the
    /// predicate never holds. The predicate is definitely true iff there is
    /// none.
    pub fn definitely<P>(&self, predicate: &P) -> bool
    where
        P: Predicate<S> + ?Sized,
    {
        let initial = self.lattice.initial();
        if self.holds_at(predicate, initial) {
            return true;
        }

        // States reachable by a path on which the predicate has never held.
        let mut frontier = BTreeSet::from([initial.clone()]);

        while !frontier.is_empty() {
            let mut next = BTreeSet::new();

            for state in &frontier {
                let successors = self.lattice.find_reachable_states(state);
                if successors.is_empty() {
                    debug!(sink = %state, "Sink reached without the predicate holding");
                    return false;
                }
                next.extend(
                    successors
                        .into_iter()
                        .filter(|s| !self.holds_at(predicate, s)),
                );
            }

            frontier = next;
        }

        true
    }

    /// Evaluate the predicate on the local states selected by `state`.
    ///
    /// The predicate never holds at a state that is not a real cut (an
    /// initial state whose first events are inconsistent), nor where a
    /// process has no events and so no local state.
    fn holds_at<P>(&self, predicate: &P, state: &GlobalState) -> bool
    where
        P: Predicate<S> + ?Sized,
    {
        if !self.lattice.is_consistent(state) {
            return false;
        }

        let pair = self.lattice.pair();
        let local_i = self.logs[pair.i().index()].get(state.index_of(pair.i()));
        let local_j = self.logs[pair.j().index()].get(state.index_of(pair.j()));

        match (local_i, local_j) {
            (Some(event_i), Some(event_j)) => predicate.holds(&event_i.state, &event_j.state),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ProcessId, VectorClock};
    use crate::events::Event;
    use crate::lattice::{build_lattice, ProcessPair};

    fn log(owner: usize, events: &[(&'static str, &[u64])]) -> EventLog<&'static str> {
        let mut log = EventLog::new(ProcessId(owner), events[0].1.len());
        for (state, slots) in events {
            log.append(Event::new(
                *state,
                VectorClock::from_slots(ProcessId(owner), slots.to_vec()),
            ));
        }
        log
    }

    fn pair01() -> ProcessPair {
        ProcessPair::new(ProcessId(0), ProcessId(1))
    }

    fn gs(indices: &[usize]) -> GlobalState {
        GlobalState::from_indices(indices.to_vec())
    }

    fn both(a: &'static str, b: &'static str) -> impl Fn(&&'static str, &&'static str) -> bool {
        move |i: &&'static str, j: &&'static str| *i == a && *j == b
    }

    /// Two independent processes with two events each: a full 2x2 grid.
    fn grid() -> Vec<EventLog<&'static str>> {
        vec![
            log(0, &[("a", &[1, 0]), ("X", &[2, 0])]),
            log(1, &[("b", &[0, 1]), ("Y", &[0, 2])]),
        ]
    }

    #[test]
    fn test_true_at_initial_is_possibly_and_definitely() {
        let logs = grid();
        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("a", "b"));

        assert!(verdict.possibly);
        assert!(verdict.definitely);
        assert_eq!(verdict.witness, Some(gs(&[0, 0])));
        assert_eq!(verdict.rounds, 1);
    }

    #[test]
    fn test_true_at_unique_sink_is_definitely() {
        let logs = grid();
        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("X", "Y"));

        assert!(verdict.possibly);
        assert!(verdict.definitely);
        assert_eq!(verdict.witness, Some(gs(&[1, 1])));
        assert_eq!(verdict.rounds, 3);
    }

    #[test]
    fn test_bypassable_state_is_possibly_only() {
        // Holds only at (1,0); the path through (0,1) avoids it.
        let logs = grid();
        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("X", "b"));

        assert!(verdict.possibly);
        assert!(!verdict.definitely);
        assert_eq!(verdict.witness, Some(gs(&[1, 0])));
    }

    #[test]
    fn test_forced_state_is_definitely() {
        // P1's second event receives P0's second event, so (0,1) is
        // inconsistent and every run passes through (1,0).
        let logs = vec![
            log(0, &[("a", &[1, 0]), ("X", &[2, 0])]),
            log(1, &[("b", &[0, 1]), ("Y", &[2, 2])]),
        ];
        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("X", "b"));

        assert!(verdict.possibly);
        assert!(verdict.definitely);
    }

    #[test]
    fn test_never_true_is_neither() {
        let logs = vec![
            log(0, &[("a", &[1, 0]), ("X", &[2, 0])]),
            log(1, &[("b", &[0, 1]), ("Y", &[2, 2])]),
        ];
        let lattice = build_lattice(&logs, pair01());
        assert_eq!(lattice.len(), 3);

        // "a" with "Y" is exactly the inconsistent pair.
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("a", "Y"));

        assert!(!verdict.possibly);
        assert!(!verdict.definitely);
        assert_eq!(verdict.witness, None);
        assert_eq!(verdict.rounds, 3);
    }

    #[test]
    fn test_inconsistent_root_never_satisfies() {
        // P1's only event has seen P0's second event, so "A" (P0's first)
        // and "B" never coexist even though they select the initial state.
        let logs = vec![
            log(0, &[("A", &[1, 0]), ("C", &[2, 0])]),
            log(1, &[("B", &[2, 1])]),
        ];
        assert!(!logs[0]
            .event(0)
            .clock
            .check_consistency(ProcessId(1), &logs[1].event(0).clock));

        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("A", "B"));

        assert!(!verdict.possibly);
        assert!(!verdict.definitely);
        assert_eq!(verdict.witness, None);
        assert_eq!(verdict.rounds, 2);
    }

    #[test]
    fn test_inconsistent_root_still_anchors_traversal() {
        let logs = vec![
            log(0, &[("A", &[1, 0]), ("C", &[2, 0])]),
            log(1, &[("B", &[2, 1])]),
        ];
        let lattice = build_lattice(&logs, pair01());
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&both("C", "B"));

        assert!(verdict.possibly);
        assert!(verdict.definitely);
        assert_eq!(verdict.witness, Some(gs(&[1, 0])));
    }

    #[test]
    fn test_cut_across_all_paths_is_definitely() {
        // Holds at both (1,0) and (0,1): every path crosses one of them.
        let logs = grid();
        let lattice = build_lattice(&logs, pair01());
        let predicate = |i: &&'static str, j: &&'static str| (*i == "X") != (*j == "Y");
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&predicate);

        assert!(verdict.possibly);
        assert!(verdict.definitely);
    }

    #[test]
    fn test_empty_log_is_neither() {
        let logs = vec![log(0, &[("a", &[1, 0])]), EventLog::new(ProcessId(1), 2)];
        let lattice = build_lattice(&logs, pair01());
        let always = |_: &&'static str, _: &&'static str| true;
        let verdict = PredicateEvaluator::new(&lattice, &logs).evaluate(&always);

        assert!(!verdict.possibly);
        assert!(!verdict.definitely);
    }

    #[test]
    fn test_diamond_frontier_is_deduplicated() {
        // Three events each, all concurrent: (1,1) is reachable two ways
        // but must be expanded once.
        let logs = vec![
            log(0, &[("a", &[1, 0]), ("a", &[2, 0]), ("a", &[3, 0])]),
            log(1, &[("b", &[0, 1]), ("b", &[0, 2]), ("b", &[0, 3])]),
        ];
        let lattice = build_lattice(&logs, pair01());
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let counting = |_: &&'static str, _: &&'static str| {
            calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            false
        };
        let evaluator = PredicateEvaluator::new(&lattice, &logs);
        let (witness, rounds) = evaluator.possibly(&counting);

        assert_eq!(witness, None);
        assert_eq!(rounds, 5);
        assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 9);
    }
}
