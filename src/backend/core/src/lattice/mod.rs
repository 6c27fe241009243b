//! The lattice of consistent global states.
//!
//! This module handles:
//! - [`GlobalState`]: one event index per process, the lattice node
//! - [`ProcessPair`]: the two processes whose indices vary in one lattice
//! - [`Lattice`]: the consistent states and the "advance one process by one
//!   event" cover relation between them
//! - [`build_lattice`]: construction from two event logs

mod builder;
mod state;

pub use builder::{build_lattice, LatticeBuilder};
pub use state::{GlobalState, ProcessPair};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Consistent global states of one process pair, with their successor edges.
///
/// Built fresh for every (predicate, process pair) check and owned by the
/// caller; nothing is shared between checks.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// The cover relation: an edge `a -> b` means `b` advances one process of `a` by one event
    graph: DiGraph<GlobalState, ()>,

    /// Map from state to graph node for O(1) lookup
    index: HashMap<GlobalState, NodeIndex>,

    /// Node of the all-zero initial state
    initial: NodeIndex,

    /// Whether the initial state is itself a consistent cut, rather than
    /// only the root traversals start from
    root_consistent: bool,

    /// Processes whose indices vary
    pair: ProcessPair,
}

impl Lattice {
    /// Assemble a lattice from its consistent states. Edges are derived
    /// from the cover relation restricted to `pair`.
    ///
    /// `initial` is added as the root when `states` does not contain it;
    /// it is then a member but not a consistent state.
    pub(crate) fn from_states(
        pair: ProcessPair,
        initial: GlobalState,
        states: impl IntoIterator<Item = GlobalState>,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for state in states {
            if !index.contains_key(&state) {
                let node = graph.add_node(state.clone());
                index.insert(state, node);
            }
        }
        let (initial, root_consistent) = match index.get(&initial) {
            Some(node) => (*node, true),
            None => {
                let node = graph.add_node(initial.clone());
                index.insert(initial, node);
                (node, false)
            }
        };

        let nodes: Vec<NodeIndex> = graph.node_indices().collect();
        for node in nodes {
            for process in pair.processes() {
                let successor = graph[node].advanced(process);
                if let Some(&next) = index.get(&successor) {
                    graph.add_edge(node, next, ());
                }
            }
        }

        Self {
            graph,
            index,
            initial,
            root_consistent,
            pair,
        }
    }

    /// The all-zero state every traversal starts from.
    pub fn initial(&self) -> &GlobalState {
        &self.graph[self.initial]
    }

    /// Whether the first events of both processes can coexist. When they
    /// cannot, the initial state is a root only and no predicate holds there.
    pub fn is_root_consistent(&self) -> bool {
        self.root_consistent
    }

    /// Whether `state` is a member that corresponds to a real cut.
    pub fn is_consistent(&self, state: &GlobalState) -> bool {
        match self.index.get(state) {
            Some(&node) => node != self.initial || self.root_consistent,
            None => false,
        }
    }

    pub fn pair(&self) -> ProcessPair {
        self.pair
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Always false: the initial state is a member of every lattice.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of cover-relation edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, state: &GlobalState) -> bool {
        self.index.contains_key(state)
    }

    /// All states, in ascending order.
    pub fn states(&self) -> Vec<&GlobalState> {
        let mut states: Vec<&GlobalState> = self.graph.node_weights().collect();
        states.sort();
        states
    }

    /// Immediate successors of `state`: members of the lattice that advance
    /// exactly one process by exactly one event. Ascending order; empty when
    /// `state` is maximal.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not a member of this lattice.
    pub fn find_reachable_states(&self, state: &GlobalState) -> Vec<GlobalState> {
        let node = self.node(state);
        let mut successors: Vec<GlobalState> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|next| self.graph[next].clone())
            .collect();
        successors.sort();
        successors
    }

    /// Whether `state` has no successors.
    pub fn is_sink(&self, state: &GlobalState) -> bool {
        self.graph
            .neighbors_directed(self.node(state), Direction::Outgoing)
            .next()
            .is_none()
    }

    /// States without successors, in ascending order.
    pub fn sinks(&self) -> Vec<&GlobalState> {
        let mut sinks: Vec<&GlobalState> = self
            .graph
            .node_indices()
            .filter(|&node| {
                self.graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|node| &self.graph[node])
            .collect();
        sinks.sort();
        sinks
    }

    fn node(&self, state: &GlobalState) -> NodeIndex {
        match self.index.get(state) {
            Some(node) => *node,
            None => panic!("state {} is not a member of the lattice", state),
        }
    }
}
