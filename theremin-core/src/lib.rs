//! Board-agnostic core logic for the theremin controller
//!
//! This crate contains the cooperative runtime the sensor drivers run on,
//! independent of any specific hardware:
//!
//! - Continuations (type-erased "what to do next" values)
//! - Cooperative scheduler with a FIFO ready queue and a deadline queue
//! - Trampoline driver that runs continuation chains in constant stack
//! - Sensor configuration types and validation
//! - Error taxonomy shared by the runtime and its clients

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod continuation;
pub mod error;
pub mod scheduler;
pub mod trampoline;

pub use continuation::{Callback, Continuation};
pub use error::Error;
pub use scheduler::{Scheduler, SchedulerStats};
