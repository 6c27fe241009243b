//! Thread-safe storage for the event logs of all processes.

use metrics::counter;
use parking_lot::{RwLock, RwLockReadGuard};
use tracing::trace;

use super::log::{Event, EventLog};
use crate::clock::{ProcessId, VectorClock};

/// One [`EventLog`] per process behind a single lock.
///
/// Producers append concurrently during ingestion. Once every producer has
/// terminated the logs are only read, through [`EventStore::read`].
#[derive(Debug)]
pub struct EventStore<S> {
    logs: RwLock<Vec<EventLog<S>>>,
    process_count: usize,
}

impl<S> EventStore<S> {
    pub fn new(process_count: usize) -> Self {
        let logs = (0..process_count)
            .map(|p| EventLog::new(ProcessId(p), process_count))
            .collect();
        Self {
            logs: RwLock::new(logs),
            process_count,
        }
    }

    pub fn process_count(&self) -> usize {
        self.process_count
    }

    /// Append an event to the log of `process_id`.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` is out of range or the event violates the
    /// log's clock invariants (see [`EventLog::append`]).
    pub fn append(&self, process_id: ProcessId, event: Event<S>) {
        assert!(
            process_id.index() < self.process_count,
            "{} out of range for {} processes",
            process_id,
            self.process_count
        );

        trace!(process = %process_id, clock = %event.clock, "Event received");

        self.logs.write()[process_id.index()].append(event);
        counter!("cutline_events_ingested_total").increment(1);
    }

    /// Append a local state together with the clock snapshot taken at it.
    pub fn append_event(&self, process_id: ProcessId, state: S, clock: VectorClock) {
        self.append(process_id, Event::new(state, clock));
    }

    /// Number of events logged for `process_id`.
    pub fn len_of(&self, process_id: ProcessId) -> usize {
        self.logs.read()[process_id.index()].len()
    }

    /// Shared read access to all logs, indexed by process.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<EventLog<S>>> {
        self.logs.read()
    }

    /// Take ownership of the logs.
    pub fn into_logs(self) -> Vec<EventLog<S>> {
        self.logs.into_inner()
    }
}
