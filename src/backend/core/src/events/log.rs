//! Events and the append-only log of a single process.

use serde::{Deserialize, Serialize};

use crate::clock::{ProcessId, VectorClock};

/// A local-state snapshot taken at one event of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<S> {
    /// Value of the process's local state right after the event
    pub state: S,
    /// The process's vector clock at the event
    pub clock: VectorClock,
}

impl<S> Event<S> {
    pub fn new(state: S, clock: VectorClock) -> Self {
        Self { state, clock }
    }
}

/// The ordered events of one process.
///
/// Appends are validated: the clock must belong to this process, have one
/// slot per process, and strictly advance the process's own slot.
#[derive(Debug, Clone, Serialize)]
pub struct EventLog<S> {
    process_id: ProcessId,
    process_count: usize,
    events: Vec<Event<S>>,
}

impl<S> EventLog<S> {
    /// Create an empty log for `process_id`.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` is not below `process_count`.
    pub fn new(process_id: ProcessId, process_count: usize) -> Self {
        assert!(
            process_id.index() < process_count,
            "{} out of range for {} processes",
            process_id,
            process_count
        );
        Self {
            process_id,
            process_count,
            events: Vec::new(),
        }
    }

    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Append an event.
    ///
    /// # Panics
    ///
    /// Panics if the clock is owned by another process, has the wrong
    /// width, or does not advance the owner's slot past the previous event.
    pub fn append(&mut self, event: Event<S>) {
        assert_eq!(
            event.clock.process_id(),
            self.process_id,
            "clock owned by {} appended to the log of {}",
            event.clock.process_id(),
            self.process_id
        );
        assert_eq!(
            event.clock.len(),
            self.process_count,
            "clock width {} does not match {} processes",
            event.clock.len(),
            self.process_count
        );
        if let Some(last) = self.events.last() {
            let own = self.process_id;
            assert!(
                event.clock.slot(own) > last.clock.slot(own),
                "{} clock slot must strictly increase ({} -> {})",
                own,
                last.clock.slot(own),
                event.clock.slot(own)
            );
        }
        self.events.push(event);
    }

    /// Event at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&Event<S>> {
        self.events.get(index)
    }

    /// Event at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past the end of the log.
    pub fn event(&self, index: usize) -> &Event<S> {
        match self.events.get(index) {
            Some(event) => event,
            None => panic!(
                "event {} out of range for {} ({} events)",
                index,
                self.process_id,
                self.events.len()
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event<S>> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(owner: usize, state: &'static str, slots: &[u64]) -> Event<&'static str> {
        Event::new(state, VectorClock::from_slots(ProcessId(owner), slots.to_vec()))
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut log = EventLog::new(ProcessId(0), 2);
        log.append(event(0, "a", &[1, 0]));
        log.append(event(0, "b", &[2, 0]));
        log.append(event(0, "c", &[3, 4]));

        let states: Vec<_> = log.iter().map(|e| e.state).collect();
        assert_eq!(states, vec!["a", "b", "c"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.event(2).clock.get(), &[3, 4]);
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let log: EventLog<u32> = EventLog::new(ProcessId(1), 2);
        assert!(log.is_empty());
        assert!(log.get(0).is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_event_out_of_range_panics() {
        let log: EventLog<u32> = EventLog::new(ProcessId(1), 2);
        log.event(0);
    }

    #[test]
    #[should_panic(expected = "appended to the log of")]
    fn test_append_rejects_foreign_clock() {
        let mut log = EventLog::new(ProcessId(0), 2);
        log.append(event(1, "x", &[0, 1]));
    }

    #[test]
    #[should_panic(expected = "strictly increase")]
    fn test_append_rejects_stalled_clock() {
        let mut log = EventLog::new(ProcessId(0), 2);
        log.append(event(0, "a", &[1, 0]));
        log.append(event(0, "b", &[1, 3]));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_append_rejects_wrong_width() {
        let mut log = EventLog::new(ProcessId(0), 3);
        log.append(event(0, "a", &[1, 0]));
    }
}
