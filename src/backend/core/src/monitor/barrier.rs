//! Termination barrier between producers and the monitor.

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::clock::ProcessId;

/// Counts running processes and blocks waiters until every process has
/// signalled termination exactly once.
#[derive(Debug)]
pub struct TerminationBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
}

#[derive(Debug)]
struct BarrierState {
    running: usize,
    terminated: Vec<bool>,
}

impl TerminationBarrier {
    pub fn new(process_count: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                running: process_count,
                terminated: vec![false; process_count],
            }),
            released: Condvar::new(),
        }
    }

    /// Record that `process_id` has terminated.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` is out of range or has already signalled.
    pub fn signal(&self, process_id: ProcessId) {
        let mut state = self.state.lock();
        let process_count = state.terminated.len();

        let Some(terminated) = state.terminated.get_mut(process_id.index()) else {
            panic!("{} out of range for {} processes", process_id, process_count);
        };
        assert!(!*terminated, "{} signalled termination twice", process_id);
        *terminated = true;
        state.running -= 1;

        debug!(process = %process_id, running = state.running, "Process terminated");

        if state.running == 0 {
            self.released.notify_all();
        }
    }

    /// Number of processes that have not yet terminated.
    pub fn running(&self) -> usize {
        self.state.lock().running
    }

    pub fn is_released(&self) -> bool {
        self.running() == 0
    }

    /// Block until every process has terminated. No timeout: a producer
    /// that never signals stalls the caller forever.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while state.running > 0 {
            self.released.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_after_all_signals() {
        let barrier = Arc::new(TerminationBarrier::new(3));

        let producers: Vec<_> = (0..3)
            .map(|p| {
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(5 * p as u64));
                    barrier.signal(ProcessId(p));
                })
            })
            .collect();

        barrier.wait();
        assert!(barrier.is_released());

        for producer in producers {
            producer.join().unwrap();
        }
    }

    #[test]
    fn test_zero_processes_is_released() {
        let barrier = TerminationBarrier::new(0);
        barrier.wait();
        assert!(barrier.is_released());
    }

    #[test]
    fn test_running_count() {
        let barrier = TerminationBarrier::new(2);
        assert_eq!(barrier.running(), 2);
        barrier.signal(ProcessId(1));
        assert_eq!(barrier.running(), 1);
        assert!(!barrier.is_released());
    }

    #[test]
    #[should_panic(expected = "twice")]
    fn test_double_signal_panics() {
        let barrier = TerminationBarrier::new(2);
        barrier.signal(ProcessId(0));
        barrier.signal(ProcessId(0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_unknown_process_panics() {
        TerminationBarrier::new(2).signal(ProcessId(5));
    }
}
