//! Cooperative scheduler
//!
//! A FIFO ready queue of runnable continuations plus a deadline queue of
//! sleeping ones. Tasks give up control voluntarily by returning the
//! continuation produced by [`Scheduler::fork`], [`Scheduler::yield_now`]
//! or [`Scheduler::wait_for`].

pub mod executor;
pub mod timer;

pub use executor::{Scheduler, SchedulerStats};
pub use timer::DeadlineQueue;
