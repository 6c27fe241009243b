#![allow(clippy::result_large_err)]
//! # Cutline Core
//!
//! Offline detection of global predicates over distributed executions.
//!
//! Processes report each local state change with a vector-clock snapshot.
//! Once every process has terminated, the monitor builds the lattice of
//! consistent global states for each bound pair of processes and decides,
//! per predicate, whether it held in *some* consistent state (possibly) and
//! whether *every* execution had to pass through such a state (definitely).
//!
//! ## Architecture
//!
//! - **Clock**: Vector clocks and the pairwise consistency test
//! - **Events**: Per-process event logs and the concurrent event store
//! - **Lattice**: Consistent global states and their cover relation
//! - **Predicate**: The closed set of predicate ids and the callback table
//! - **Detection**: Possibly / definitely traversals of a lattice
//! - **Monitor**: Termination barrier and per-predicate detection runs
//! - **Trace**: Recorded executions in JSON
//! - **Telemetry**: Structured logging setup

pub mod clock;
pub mod config;
pub mod detection;
pub mod error;
pub mod events;
pub mod lattice;
pub mod monitor;
pub mod predicate;
pub mod telemetry;
pub mod trace;

pub use error::{CutlineError, ErrorCode, ErrorDetails, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{ProcessId, VectorClock};
    pub use crate::config::{Config, MonitorConfig, PredicateBinding};
    pub use crate::detection::{PredicateEvaluator, Verdict};
    pub use crate::error::{CutlineError, ErrorCode, ErrorDetails, ErrorSeverity, Result};
    pub use crate::events::{Event, EventLog, EventStore};
    pub use crate::lattice::{build_lattice, GlobalState, Lattice, LatticeBuilder, ProcessPair};
    pub use crate::monitor::{DetectionReport, Monitor, OutcomeStatus, PredicateOutcome};
    pub use crate::predicate::{Predicate, PredicateId, PredicateTable};
    pub use crate::telemetry::{init_logging, LogFormat, LoggingConfig};
    pub use crate::trace::{Trace, TraceEvent};
}
