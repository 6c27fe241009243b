//! The monitor: collects event logs, waits for every process to terminate,
//! then checks each bound predicate.
//!
//! Ingestion ([`Monitor::receive_message`]) and termination signalling are
//! safe to call from any number of producer threads. [`Monitor::run`] blocks
//! until all producers have terminated; from then on the logs are read-only
//! and every check is single-threaded and deterministic. Each predicate gets
//! a freshly built lattice that is dropped once its verdict is recorded.

mod barrier;
mod report;

pub use barrier::TerminationBarrier;
pub use report::{DetectionReport, OutcomeStatus, PredicateOutcome};

use metrics::counter;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::clock::{ProcessId, VectorClock};
use crate::config::{MonitorConfig, PredicateBinding};
use crate::detection::PredicateEvaluator;
use crate::error::{CutlineError, Result};
use crate::events::{Event, EventLog, EventStore};
use crate::lattice::build_lattice;
use crate::predicate::{PredicateId, PredicateTable};

/// Offline global-predicate monitor.
pub struct Monitor<S> {
    config: MonitorConfig,
    bindings: Vec<PredicateBinding>,
    store: EventStore<S>,
    barrier: TerminationBarrier,
    predicates: PredicateTable<S>,
    report: RwLock<Option<DetectionReport>>,
}

impl<S> Monitor<S> {
    /// Create a monitor for `config.process_count` processes.
    ///
    /// Fails if the configuration is invalid or a bound predicate has no
    /// registered callback.
    pub fn new(config: MonitorConfig, predicates: PredicateTable<S>) -> Result<Self> {
        config.validate()?;

        let bindings = config.bindings();
        if let Some(missing) = bindings
            .iter()
            .find(|b| !predicates.is_registered(b.predicate))
        {
            return Err(CutlineError::predicate_not_registered(missing.predicate));
        }

        Ok(Self {
            store: EventStore::new(config.process_count),
            barrier: TerminationBarrier::new(config.process_count),
            config,
            bindings,
            predicates,
            report: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn process_count(&self) -> usize {
        self.config.process_count
    }

    /// Predicates this monitor checks, in order.
    pub fn bindings(&self) -> &[PredicateBinding] {
        &self.bindings
    }

    /// Append an event received from `process_id` to its log.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` is out of range or the event's clock breaks
    /// the log's invariants.
    pub fn receive_message(&self, process_id: ProcessId, event: Event<S>) {
        self.store.append(process_id, event);
    }

    /// Append a local state with its clock snapshot to the log of `process_id`.
    pub fn append_event(&self, process_id: ProcessId, state: S, clock: VectorClock) {
        self.store.append_event(process_id, state, clock);
    }

    /// Signal that `process_id` will send no more events. Must be called
    /// exactly once per process.
    pub fn process_terminated(&self, process_id: ProcessId) {
        self.barrier.signal(process_id);
    }

    /// Processes that have not yet signalled termination.
    pub fn running_processes(&self) -> usize {
        self.barrier.running()
    }

    /// Wait for every process to terminate, then check every bound predicate.
    ///
    /// A predicate whose callback panics is recorded as failed; the others
    /// are unaffected. Calling `run` again re-checks the same logs and
    /// yields the same report.
    #[instrument(skip(self), fields(processes = self.config.process_count))]
    pub fn run(&self) -> DetectionReport {
        info!(running = self.barrier.running(), "Waiting for processes to terminate");
        self.barrier.wait();

        let report = {
            let logs = self.store.read();
            info!(
                events = logs.iter().map(EventLog::len).sum::<usize>(),
                predicates = self.bindings.len(),
                "All processes terminated, checking predicates"
            );
            DetectionReport::new(
                self.bindings
                    .iter()
                    .map(|binding| self.check_predicate(&logs, *binding))
                    .collect(),
            )
        };

        *self.report.write() = Some(report.clone());
        report
    }

    /// [`Monitor::run`] on tokio's blocking pool.
    pub async fn run_async(self: Arc<Self>) -> Result<DetectionReport>
    where
        S: Send + Sync + 'static,
    {
        let report = tokio::task::spawn_blocking(move || self.run()).await?;
        Ok(report)
    }

    /// The report of the last completed run.
    pub fn report(&self) -> Option<DetectionReport> {
        self.report.read().clone()
    }

    /// One flag per predicate id. All false until a run has completed.
    pub fn possibly_true(&self) -> Vec<bool> {
        self.report
            .read()
            .as_ref()
            .map_or_else(|| vec![false; PredicateId::COUNT], DetectionReport::possibly_true)
    }

    /// One flag per predicate id. All false until a run has completed.
    pub fn definitely_true(&self) -> Vec<bool> {
        self.report
            .read()
            .as_ref()
            .map_or_else(|| vec![false; PredicateId::COUNT], DetectionReport::definitely_true)
    }

    #[instrument(skip(self, logs), fields(predicate = %binding.predicate, pair = %binding.pair()))]
    fn check_predicate(&self, logs: &[EventLog<S>], binding: PredicateBinding) -> PredicateOutcome {
        let Some(predicate) = self.predicates.get(binding.predicate) else {
            let error = CutlineError::predicate_not_registered(binding.predicate);
            error.log();
            return PredicateOutcome::failed(binding, error.to_string());
        };

        let checked = panic::catch_unwind(AssertUnwindSafe(|| {
            let lattice = build_lattice(logs, binding.pair());
            PredicateEvaluator::new(&lattice, logs).evaluate(predicate)
        }));

        match checked {
            Ok(verdict) => {
                counter!(
                    "cutline_predicate_checks_total",
                    "predicate" => binding.predicate.to_string(),
                    "outcome" => "evaluated",
                )
                .increment(1);
                info!(
                    possibly = verdict.possibly,
                    definitely = verdict.definitely,
                    witness = ?verdict.witness,
                    "Predicate checked"
                );
                PredicateOutcome::evaluated(binding, verdict)
            }
            Err(payload) => {
                counter!(
                    "cutline_predicate_checks_total",
                    "predicate" => binding.predicate.to_string(),
                    "outcome" => "failed",
                )
                .increment(1);
                let error = CutlineError::predicate_evaluation_failed(
                    binding.predicate,
                    panic_message(payload.as_ref()),
                );
                error.log();
                PredicateOutcome::failed(binding, error.to_string())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "predicate panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn clock(owner: usize, slots: &[u64]) -> VectorClock {
        VectorClock::from_slots(ProcessId(owner), slots.to_vec())
    }

    fn equal_table() -> PredicateTable<i32> {
        PredicateTable::new()
            .with(PredicateId::P0, |a: &i32, b: &i32| a == b)
            .with(PredicateId::P1, |a: &i32, b: &i32| a + b == 5)
            .with(PredicateId::P2, |_: &i32, _: &i32| false)
    }

    fn feed(monitor: &Monitor<i32>) {
        monitor.append_event(ProcessId(0), 1, clock(0, &[1, 0]));
        monitor.append_event(ProcessId(0), 3, clock(0, &[2, 0]));
        monitor.append_event(ProcessId(1), 2, clock(1, &[0, 1]));
        monitor.append_event(ProcessId(1), 3, clock(1, &[0, 2]));
        monitor.process_terminated(ProcessId(0));
        monitor.process_terminated(ProcessId(1));
    }

    #[test]
    fn test_new_rejects_unregistered_predicate() {
        let table = PredicateTable::<i32>::new().with(PredicateId::P0, |a: &i32, b: &i32| a == b);
        let err = Monitor::new(MonitorConfig::with_processes(2), table).err().unwrap();
        assert_eq!(err.code(), ErrorCode::PredicateNotRegistered);
    }

    #[test]
    fn test_flags_false_before_run() {
        let monitor = Monitor::new(MonitorConfig::with_processes(2), equal_table()).unwrap();
        assert_eq!(monitor.possibly_true(), vec![false; 4]);
        assert!(monitor.report().is_none());
        assert_eq!(monitor.running_processes(), 2);
    }

    #[test]
    fn test_run_checks_every_binding() {
        let monitor = Monitor::new(MonitorConfig::with_processes(2), equal_table()).unwrap();
        feed(&monitor);

        let report = monitor.run();
        assert_eq!(report.outcomes().len(), 3);

        // P0 holds only at the sink (3, 3). P1 holds only at (3, 2), which
        // the path through (1, 3) avoids.
        assert_eq!(monitor.possibly_true(), vec![true, true, false, false]);
        assert_eq!(monitor.definitely_true(), vec![true, false, false, false]);
    }

    #[test]
    fn test_panicking_predicate_is_isolated() {
        let table = equal_table().with(PredicateId::P1, |_: &i32, _: &i32| -> bool {
            panic!("predicate exploded")
        });
        let monitor = Monitor::new(MonitorConfig::with_processes(2), table).unwrap();
        feed(&monitor);

        let report = monitor.run();
        let failed = report.outcome(PredicateId::P1).unwrap();
        assert!(failed.is_failed());
        match &failed.status {
            OutcomeStatus::Failed { error } => assert!(error.contains("predicate exploded")),
            other => panic!("unexpected status {:?}", other),
        }

        assert!(report.outcome(PredicateId::P0).unwrap().definitely());
        assert_eq!(report.possibly_true(), vec![true, false, false, false]);
    }

    #[test]
    fn test_run_is_repeatable() {
        let monitor = Monitor::new(MonitorConfig::with_processes(2), equal_table()).unwrap();
        feed(&monitor);

        let first = monitor.run();
        let second = monitor.run();
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_async_matches_run() {
        let monitor = Arc::new(Monitor::new(MonitorConfig::with_processes(2), equal_table()).unwrap());
        feed(&monitor);

        let report = tokio_test::block_on(Arc::clone(&monitor).run_async()).unwrap();
        assert_eq!(report, monitor.run());
        assert_eq!(monitor.report(), Some(report));
    }

    #[test]
    fn test_panic_message_extraction() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "predicate panicked");
    }
}
