//! Theremin Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the controller core
//! consumes. Platform crates implement them for real hardware (sysfs GPIO
//! on Linux boards), and the optional `sim` module implements them for
//! deterministic host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  theremin-core / theremin-drivers       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  theremin-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ theremin-hal- │       │  sim (feature │
//! │     linux     │       │    "sim")     │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::DirectionalPin`] - Digital I/O
//! - [`clock::Clock`] - Monotonic time source with blocking sleep

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

pub mod clock;
pub mod gpio;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Re-export key traits at crate root for convenience
pub use clock::{Clock, Instant};
pub use gpio::{DirectionalPin, InputPin, IoPin, OutputPin, PinDirection, PinError};
