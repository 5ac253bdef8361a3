//! Runtime error taxonomy
//!
//! Every variant is fatal where it is detected: the trampoline stops and
//! hands the error to its caller. Losing an echo is not an error; ranging
//! reports it as an absent distance instead.

use core::fmt;

use theremin_hal::PinError;

use crate::config::ConfigError;

/// Errors produced by the runtime and its clients
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The reserved invalid continuation was invoked
    InvalidContinuation,
    /// A scheduling step found both the ready and the deadline queue empty
    NoPendingWork,
    /// Sensor configuration rejected at construction
    Config(ConfigError),
    /// A GPIO operation failed inside a protocol step
    Pin(PinError),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<PinError> for Error {
    fn from(e: PinError) -> Self {
        Error::Pin(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidContinuation => write!(f, "invalid continuation invoked"),
            Error::NoPendingWork => write!(f, "scheduler has no pending work"),
            Error::Config(e) => write!(f, "invalid configuration: {}", e),
            Error::Pin(e) => write!(f, "{}", e),
        }
    }
}

impl core::error::Error for Error {}
