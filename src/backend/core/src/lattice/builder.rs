//! Construction of the consistent-state lattice for a process pair.

use metrics::counter;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

use super::{GlobalState, Lattice, ProcessPair};
use crate::events::EventLog;

/// Builds [`Lattice`]s over a fixed set of event logs.
#[derive(Debug)]
pub struct LatticeBuilder<'a, S> {
    logs: &'a [EventLog<S>],
}

impl<'a, S> LatticeBuilder<'a, S> {
    /// `logs` is indexed by process id.
    pub fn new(logs: &'a [EventLog<S>]) -> Self {
        Self { logs }
    }

    pub fn process_count(&self) -> usize {
        self.logs.len()
    }

    /// Enumerate every (event of `i`, event of `j`) pair and keep the
    /// consistent ones as lattice states. All other processes stay at index 0.
    ///
    /// The initial state is always included as the traversal root, but it
    /// only counts as consistent when the first events of `i` and `j` are.
    /// If either log is empty, it is the only state.
    ///
    /// # Panics
    ///
    /// Panics if either process of `pair` has no log.
    #[instrument(skip(self), fields(process_i = %pair.i(), process_j = %pair.j()))]
    pub fn build(&self, pair: ProcessPair) -> Lattice {
        let process_count = self.logs.len();
        assert!(
            pair.fits(process_count),
            "process pair {} out of range for {} processes",
            pair,
            process_count
        );

        let log_i = &self.logs[pair.i().index()];
        let log_j = &self.logs[pair.j().index()];
        let initial = GlobalState::initial(process_count);

        let mut states = BTreeSet::new();

        for (i_index, event_i) in log_i.iter().enumerate() {
            for (j_index, event_j) in log_j.iter().enumerate() {
                if event_i.clock.check_consistency(pair.j(), &event_j.clock) {
                    let mut indices = vec![0; process_count];
                    indices[pair.i().index()] = i_index;
                    indices[pair.j().index()] = j_index;
                    states.insert(GlobalState::from_indices(indices));
                }
            }
        }

        let lattice = Lattice::from_states(pair, initial, states);

        counter!("cutline_lattice_states_total").increment(lattice.len() as u64);
        debug!(
            events_i = log_i.len(),
            events_j = log_j.len(),
            states = lattice.len(),
            edges = lattice.edge_count(),
            root_consistent = lattice.is_root_consistent(),
            "Lattice built"
        );

        lattice
    }
}

/// Build the lattice of consistent states of `pair` over `logs`.
pub fn build_lattice<S>(logs: &[EventLog<S>], pair: ProcessPair) -> Lattice {
    LatticeBuilder::new(logs).build(pair)
}
