//! Scheduler state and step algorithm
//!
//! The scheduler owns the clock, a FIFO ready queue and a deadline queue.
//! Every scheduling operation enqueues work and returns a continuation that
//! runs [`Scheduler::step`]; the trampoline then invokes whatever `step`
//! hands back. Nothing here recurses, so arbitrarily long task chains run
//! in constant stack.
//!
//! One step:
//!
//! 1. Refresh the cached `now` from the clock (never moves backwards).
//! 2. If the ready queue is empty and a deadline is pending, sleep until
//!    that deadline, pin `now` to it and promote its continuation.
//!    If the ready queue is not empty, promote the earliest deadline only
//!    when it is already due.
//! 3. Pop the front of the ready queue, or fail with
//!    [`Error::NoPendingWork`] when there is nothing at all to run.

use alloc::collections::VecDeque;
use core::time::Duration;

use log::trace;
use theremin_hal::{Clock, Instant};

use super::timer::DeadlineQueue;
use crate::continuation::Continuation;
use crate::error::Error;

/// Counters describing how the scheduler spent its time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerStats {
    /// Scheduling steps taken
    pub steps: u64,
    /// Times the clock was asked to sleep
    pub sleeps: u64,
    /// Total time requested from the clock as sleep
    pub slept: Duration,
    /// Continuations moved from the deadline queue to the ready queue
    pub promotions: u64,
    /// Largest gap seen between a deadline and its promotion
    ///
    /// Only non-zero when a busy ready queue delays a due timer. Sleeps pin
    /// `now` to the deadline, so clock overshoot shows up in later steps'
    /// refreshed time rather than here.
    pub max_lateness: Duration,
}

/// Cooperative scheduler for one thread
///
/// Created with [`Scheduler::new`] and passed by `&mut` to every
/// continuation it runs. Dropping it drops any queued continuations.
pub struct Scheduler<C> {
    clock: C,
    now: Instant,
    ready: VecDeque<Continuation<C>>,
    waiting: DeadlineQueue<C>,
    stats: SchedulerStats,
}

impl<C: Clock> Scheduler<C> {
    /// Create an idle scheduler driven by `clock`
    pub fn new(clock: C) -> Self {
        let now = clock.now();
        trace!("scheduler created at {:?}", now);
        Self {
            clock,
            now,
            ready: VecDeque::new(),
            waiting: DeadlineQueue::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Run `initial` and everything it schedules until `exit` or an error
    pub fn run(&mut self, initial: Continuation<C>) -> Result<(), Error> {
        crate::trampoline::drive(self, initial)
    }

    /// Make both `first` and `second` runnable, in that order
    pub fn fork(&mut self, first: Continuation<C>, second: Continuation<C>) -> Continuation<C> {
        self.ready.push_back(first);
        self.ready.push_back(second);
        Continuation::schedule()
    }

    /// Let other ready tasks run before `next`
    pub fn yield_now(&mut self, next: Continuation<C>) -> Continuation<C> {
        self.ready.push_back(next);
        Continuation::schedule()
    }

    /// Run `next` no earlier than `duration` from now
    ///
    /// `now` is refreshed from the clock first, so the deadline counts from
    /// the moment of the call, not from the start of the current step.
    pub fn wait_for(&mut self, duration: Duration, next: Continuation<C>) -> Continuation<C> {
        self.refresh_now();
        let deadline = self.now + duration;
        self.waiting.push(deadline, next);
        Continuation::schedule()
    }

    /// End the current task; whatever is queued runs next
    pub fn finish(&mut self) -> Continuation<C> {
        Continuation::schedule()
    }

    /// Select the next continuation to run
    pub fn step(&mut self) -> Result<Continuation<C>, Error> {
        self.refresh_now();
        self.stats.steps += 1;

        if let Some(deadline) = self.waiting.peek_deadline() {
            if self.ready.is_empty() {
                if deadline > self.now {
                    let duration = deadline - self.now;
                    trace!("idle, sleeping {:?}", duration);
                    self.clock.sleep(duration);
                    self.stats.sleeps += 1;
                    self.stats.slept += duration;
                    self.now = deadline;
                }
                self.promote();
            } else if deadline <= self.now {
                self.promote();
            }
        }

        self.ready.pop_front().ok_or(Error::NoPendingWork)
    }

    /// Cached current time (refreshed at every step and `wait_for`)
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Clock driving this scheduler
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Continuations parked on a deadline
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Check if nothing is queued at all
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.waiting.is_empty()
    }

    /// Counters since creation
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Drop all queued work and return the clock
    pub fn into_clock(self) -> C {
        self.clock
    }

    fn refresh_now(&mut self) {
        let now = self.clock.now();
        if now > self.now {
            self.now = now;
        }
    }

    fn promote(&mut self) {
        if let Some((deadline, cont)) = self.waiting.pop() {
            let lateness = self.now.saturating_duration_since(deadline);
            if lateness > self.stats.max_lateness {
                self.stats.max_lateness = lateness;
            }
            self.stats.promotions += 1;
            self.ready.push_back(cont);
        }
    }
}
