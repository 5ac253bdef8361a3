//! Deadline queue
//!
//! Continuations parked until an absolute [`Instant`]. The earliest deadline
//! is always at the front; equal deadlines come out in insertion order.

use alloc::collections::BinaryHeap;
use core::cmp::Ordering;

use theremin_hal::Instant;

use crate::continuation::Continuation;

struct Timer<C> {
    deadline: Instant,
    seq: u64,
    cont: Continuation<C>,
}

impl<C> Timer<C> {
    fn key(&self) -> (Instant, u64) {
        (self.deadline, self.seq)
    }
}

impl<C> PartialEq for Timer<C> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<C> Eq for Timer<C> {}

impl<C> PartialOrd for Timer<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Timer<C> {
    // BinaryHeap is a max-heap; reverse so the earliest (deadline, seq) pops first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Min-queue of continuations keyed by deadline
pub struct DeadlineQueue<C> {
    heap: BinaryHeap<Timer<C>>,
    next_seq: u64,
}

impl<C> DeadlineQueue<C> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Park `cont` until `deadline`
    pub fn push(&mut self, deadline: Instant, cont: Continuation<C>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Timer {
            deadline,
            seq,
            cont,
        });
    }

    /// Earliest deadline, if any
    pub fn peek_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|t| t.deadline)
    }

    /// Remove the entry with the earliest deadline
    pub fn pop(&mut self) -> Option<(Instant, Continuation<C>)> {
        self.heap.pop().map(|t| (t.deadline, t.cont))
    }

    /// Number of parked continuations
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if nothing is parked
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<C> Default for DeadlineQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    type Queue = DeadlineQueue<()>;

    #[test]
    fn test_empty() {
        let mut q = Queue::new();
        assert!(q.is_empty());
        assert_eq!(q.peek_deadline(), None);
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_earliest_first() {
        let mut q = Queue::new();
        q.push(Instant::from_micros(30), Continuation::exit());
        q.push(Instant::from_micros(10), Continuation::invalid());
        q.push(Instant::from_micros(20), Continuation::exit());

        assert_eq!(q.len(), 3);
        assert_eq!(q.peek_deadline(), Some(Instant::from_micros(10)));

        let (deadline, cont) = q.pop().unwrap();
        assert_eq!(deadline, Instant::from_micros(10));
        assert!(cont.is_invalid());
        assert_eq!(q.pop().unwrap().0, Instant::from_micros(20));
        assert_eq!(q.pop().unwrap().0, Instant::from_micros(30));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut q = Queue::new();
        let at = Instant::from_micros(5);
        q.push(at, Continuation::invalid());
        q.push(at, Continuation::exit());

        assert!(q.pop().unwrap().1.is_invalid());
        assert!(q.pop().unwrap().1.is_exit());
    }

    proptest! {
        #[test]
        fn prop_pops_sorted(deadlines in prop::collection::vec(0u64..1_000, 0..64)) {
            let mut q = Queue::new();
            for &d in &deadlines {
                q.push(Instant::from_micros(d), Continuation::exit());
            }

            let mut popped = Vec::new();
            while let Some((deadline, _)) = q.pop() {
                popped.push(deadline);
            }

            let mut expected: Vec<Instant> =
                deadlines.iter().map(|&d| Instant::from_micros(d)).collect();
            expected.sort();
            prop_assert_eq!(popped, expected);
        }
    }
}
