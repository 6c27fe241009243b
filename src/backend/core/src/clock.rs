//! Vector clocks and the pairwise consistency test.
//!
//! Each process owns one [`VectorClock`] with a slot per process. Slot `k`
//! counts how many events of process `k` are causally known to the owner.
//! The clock is ticked on every local event and merged (pointwise max) on
//! every message receipt; a snapshot is attached to each logged event.
//!
//! Besides [`VectorClock::check_consistency`], which drives detection, the
//! causal-order queries [`VectorClock::happened_before`] and
//! [`VectorClock::is_concurrent_with`] are offered to callers; trace
//! validation uses the former to reject clocks that move backwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identity of a monitored process, used as an index into clocks and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl ProcessId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ProcessId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A vector clock owned by a single process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorClock {
    process_id: ProcessId,
    slots: Vec<u64>,
}

impl VectorClock {
    /// Create an all-zero clock for `process_id` in a run of `process_count` processes.
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
            slots: vec![0; process_count],
        }
    }

    /// Rebuild a clock snapshot from its raw slot values.
    ///
    /// # Panics
    ///
    /// Panics if `process_id` has no slot in `slots`.
    pub fn from_slots(process_id: ProcessId, slots: Vec<u64>) -> Self {
        assert!(
            process_id.index() < slots.len(),
            "{} out of range for a clock of width {}",
            process_id,
            slots.len()
        );
        Self { process_id, slots }
    }

    /// The process owning this clock.
    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    /// Number of slots (equal to the process count).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record a local event: the owner's slot goes up by exactly one.
    pub fn increment(&mut self) {
        self.slots[self.process_id.index()] += 1;
    }

    /// Current slot values, one per process.
    pub fn get(&self) -> &[u64] {
        &self.slots
    }

    /// Value of the slot for `process`.
    ///
    /// # Panics
    ///
    /// Panics if `process` is out of range.
    pub fn slot(&self, process: ProcessId) -> u64 {
        self.slots[process.index()]
    }

    /// Merge a received clock into this one (pointwise maximum).
    ///
    /// # Panics
    ///
    /// Panics if the clocks have different widths.
    pub fn update(&mut self, other: &VectorClock) {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "cannot merge clocks of different widths"
        );
        for (mine, theirs) in self.slots.iter_mut().zip(&other.slots) {
            *mine = (*mine).max(*theirs);
        }
    }

    /// Whether the event stamped with `self` (on this clock's owner `p`) and
    /// the event stamped with `other` (on process `other_process_id`, `q`)
    /// can belong to the same consistent global state.
    ///
    /// Holds iff `other[q] >= self[q]` and `self[p] >= other[p]`: neither
    /// event has seen more of the other process than that process had done
    /// at its own event.
    pub fn check_consistency(&self, other_process_id: ProcessId, other: &VectorClock) -> bool {
        let p = self.process_id;
        let q = other_process_id;
        other.slot(q) >= self.slot(q) && self.slot(p) >= other.slot(p)
    }

    /// Whether `self` causally precedes `other` (`self <= other` pointwise, and not equal).
    pub fn happened_before(&self, other: &VectorClock) -> bool {
        matches!(self.partial_cmp_slots(other), Some(Ordering::Less))
    }

    /// Neither clock causally precedes the other.
    pub fn is_concurrent_with(&self, other: &VectorClock) -> bool {
        self.partial_cmp_slots(other).is_none()
    }

    fn partial_cmp_slots(&self, other: &VectorClock) -> Option<Ordering> {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "cannot compare clocks of different widths"
        );

        let mut less = false;
        let mut greater = false;
        for (a, b) in self.slots.iter().zip(&other.slots) {
            match a.cmp(b) {
                Ordering::Less => less = true,
                Ordering::Greater => greater = true,
                Ordering::Equal => {}
            }
        }

        match (less, greater) {
            (false, false) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (true, true) => None,
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.process_id, self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(owner: usize, slots: &[u64]) -> VectorClock {
        VectorClock::from_slots(ProcessId(owner), slots.to_vec())
    }

    #[test]
    fn test_new_clock_is_zero() {
        let vc = VectorClock::new(ProcessId(1), 3);
        assert_eq!(vc.get(), &[0, 0, 0]);
        assert_eq!(vc.process_id(), ProcessId(1));
        assert_eq!(vc.len(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_new_clock_rejects_out_of_range_owner() {
        VectorClock::new(ProcessId(3), 3);
    }

    #[test]
    fn test_increment_only_touches_own_slot() {
        let mut vc = clock(1, &[4, 2, 7]);
        vc.increment();
        assert_eq!(vc.get(), &[4, 3, 7]);
        vc.increment();
        assert_eq!(vc.get(), &[4, 4, 7]);
    }

    #[test]
    fn test_update_takes_pointwise_max() {
        let mut a = clock(0, &[3, 1, 2]);
        let b = clock(1, &[2, 5, 1]);
        a.update(&b);
        assert_eq!(a.get(), &[3, 5, 2]);
        assert_eq!(a.process_id(), ProcessId(0));
    }

    #[test]
    fn test_update_commutative() {
        let a = clock(0, &[3, 0, 9]);
        let b = clock(1, &[1, 6, 2]);

        let mut ab = a.clone();
        ab.update(&b);
        let mut ba = b.clone();
        ba.update(&a);

        assert_eq!(ab.get(), ba.get());
    }

    #[test]
    fn test_update_idempotent() {
        let a = clock(2, &[1, 4, 2]);
        let mut merged = a.clone();
        merged.update(&a);
        assert_eq!(merged, a);
    }

    #[test]
    #[should_panic(expected = "different widths")]
    fn test_update_rejects_width_mismatch() {
        let mut a = clock(0, &[1, 0]);
        a.update(&clock(0, &[1, 0, 0]));
    }

    #[test]
    fn test_consistency_reflexive() {
        let a = clock(0, &[2, 1]);
        assert!(a.check_consistency(ProcessId(0), &a));
    }

    #[test]
    fn test_consistency_of_concurrent_events() {
        let p0 = clock(0, &[1, 0]);
        let p1 = clock(1, &[0, 1]);
        assert!(p0.check_consistency(ProcessId(1), &p1));
        assert!(p1.check_consistency(ProcessId(0), &p0));
    }

    #[test]
    fn test_consistency_rejects_event_ahead_of_sender() {
        // P0's first event was a receive of P1's second event.
        let p0 = clock(0, &[1, 2]);
        let p1_first = clock(1, &[0, 1]);
        let p1_second = clock(1, &[0, 2]);

        assert!(!p0.check_consistency(ProcessId(1), &p1_first));
        assert!(p0.check_consistency(ProcessId(1), &p1_second));
    }

    #[test]
    fn test_consistency_rejects_receiver_ahead_of_sender() {
        // P1's event knows P0's second event, P0 is still at its first.
        let p0 = clock(0, &[1, 0]);
        let p1 = clock(1, &[2, 1]);
        assert!(!p0.check_consistency(ProcessId(1), &p1));
    }

    #[test]
    fn test_happened_before_and_concurrency() {
        let a = clock(0, &[1, 0]);
        let b = clock(1, &[1, 1]);
        let c = clock(1, &[0, 1]);

        assert!(a.happened_before(&b));
        assert!(!b.happened_before(&a));
        assert!(!a.happened_before(&a));
        assert!(a.is_concurrent_with(&c));
        assert!(!a.is_concurrent_with(&b));
    }

    #[test]
    fn test_display() {
        assert_eq!(clock(1, &[0, 2]).to_string(), "P1[0, 2]");
    }
}
