//! Recorded traces.
//!
//! A trace is the complete event history of a run, one list of
//! `{ state, clock }` entries per process, in the order each process
//! produced them:
//!
//! ```json
//! {
//!   "process_count": 2,
//!   "processes": [
//!     [{ "state": 1, "clock": [1, 0] }],
//!     [{ "state": 2, "clock": [1, 1] }]
//!   ]
//! }
//! ```
//!
//! Traces come from outside the process, so [`Trace::validate`] reports
//! malformed input as errors instead of the panics the event log raises.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::clock::{ProcessId, VectorClock};
use crate::error::{CutlineError, Result};
use crate::events::{Event, EventLog};

/// One recorded local state and the clock snapshot taken with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent<S> {
    pub state: S,
    pub clock: Vec<u64>,
}

/// Event history of every process in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace<S> {
    pub process_count: usize,
    pub processes: Vec<Vec<TraceEvent<S>>>,
}

impl<S> Trace<S> {
    /// An empty trace for `process_count` processes.
    pub fn new(process_count: usize) -> Self {
        Self {
            process_count,
            processes: (0..process_count).map(|_| Vec::new()).collect(),
        }
    }

    /// Record an event of `process_id`.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` is out of range.
    pub fn push(&mut self, process_id: ProcessId, state: S, clock: &VectorClock) {
        assert!(
            process_id.index() < self.process_count,
            "{} out of range for {} processes",
            process_id,
            self.process_count
        );
        self.processes[process_id.index()].push(TraceEvent {
            state,
            clock: clock.get().to_vec(),
        });
    }

    /// Total number of recorded events.
    pub fn event_count(&self) -> usize {
        self.processes.iter().map(Vec::len).sum()
    }

    /// Check that the trace could have been produced by a real run: one
    /// history per process, clocks one slot per process, and each process's
    /// own slot strictly increasing.
    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(CutlineError::invalid_trace("Trace has no processes"));
        }
        if self.processes.len() != self.process_count {
            return Err(CutlineError::invalid_trace(format!(
                "Trace declares {} processes but records {} histories",
                self.process_count,
                self.processes.len()
            )));
        }

        for (process, events) in self.processes.iter().enumerate() {
            let pid = ProcessId(process);
            let mut previous: Option<VectorClock> = None;
            for (index, event) in events.iter().enumerate() {
                if event.clock.len() != self.process_count {
                    return Err(CutlineError::clock_width_mismatch(
                        process,
                        index,
                        event.clock.len(),
                        self.process_count,
                    ));
                }
                let clock = VectorClock::from_slots(pid, event.clock.clone());
                if let Some(prev) = &previous {
                    let (before, own) = (prev.slot(pid), clock.slot(pid));
                    if own <= before {
                        return Err(CutlineError::non_monotonic_clock(process, index, before, own));
                    }
                    // Knowledge of other processes is never lost.
                    if !prev.happened_before(&clock) {
                        return Err(CutlineError::clock_regression(process, index));
                    }
                }
                previous = Some(clock);
            }
        }
        Ok(())
    }

    /// Per-process event sequences, in recording order. Validates first.
    pub fn into_events(self) -> Result<Vec<(ProcessId, Vec<Event<S>>)>> {
        self.validate()?;
        Ok(self
            .processes
            .into_iter()
            .enumerate()
            .map(|(process, events)| {
                let pid = ProcessId(process);
                let events = events
                    .into_iter()
                    .map(|e| Event::new(e.state, VectorClock::from_slots(pid, e.clock)))
                    .collect();
                (pid, events)
            })
            .collect())
    }

    /// Build the event logs directly, without going through a monitor.
    pub fn into_logs(self) -> Result<Vec<EventLog<S>>> {
        let process_count = self.process_count;
        Ok(self
            .into_events()?
            .into_iter()
            .map(|(pid, events)| {
                let mut log = EventLog::new(pid, process_count);
                for event in events {
                    log.append(event);
                }
                log
            })
            .collect())
    }
}

impl<S: DeserializeOwned> Trace<S> {
    /// Parse and validate a JSON trace.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let trace: Self = serde_json::from_str(json)?;
        trace.validate()?;
        debug!(
            processes = trace.process_count,
            events = trace.event_count(),
            "Trace loaded"
        );
        Ok(trace)
    }

    /// Read, parse and validate a JSON trace file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CutlineError::from(e).with_context("path", path.display().to_string()))?;
        Self::from_json_str(&json)
    }
}

impl<S: Serialize> Trace<S> {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
