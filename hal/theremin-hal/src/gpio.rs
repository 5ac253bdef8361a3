//! GPIO pin abstractions
//!
//! Provides traits for digital input and output pins that can be implemented
//! by platform HALs. Unlike microcontroller registers, pins exposed through
//! an operating system can fail, so every operation is fallible.

use core::fmt;

/// Errors that can occur while driving a GPIO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin could not be claimed (export failed or already in use)
    Unavailable(u32),
    /// Reading or writing the pin failed
    Io(u32),
    /// Pin reported a value that is neither high nor low
    InvalidValue(u32),
}

impl PinError {
    /// Pin number the error refers to
    pub fn pin(&self) -> u32 {
        match *self {
            PinError::Unavailable(pin) | PinError::Io(pin) | PinError::InvalidValue(pin) => pin,
        }
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Unavailable(pin) => write!(f, "gpio {} unavailable", pin),
            PinError::Io(pin) => write!(f, "gpio {} i/o failure", pin),
            PinError::InvalidValue(pin) => write!(f, "gpio {} returned an invalid value", pin),
        }
    }
}

impl core::error::Error for PinError {}

// Lets platform pins expose the embedded-hal digital traits with this error
#[cfg(feature = "embedded-hal")]
impl embedded_hal::digital::Error for PinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinDirection {
    /// Pin is sampled by the controller
    Input,
    /// Pin is driven by the controller
    Output,
}

impl PinDirection {
    /// Keyword used by sysfs-style interfaces
    pub const fn as_str(self) -> &'static str {
        match self {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        }
    }
}

/// Pin whose direction is selected at runtime
pub trait DirectionalPin {
    /// Configure the pin as input or output
    fn set_direction(&mut self, direction: PinDirection) -> Result<(), PinError>;
}

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self) -> Result<(), PinError>;

    /// Set the pin low (logic 0)
    fn set_low(&mut self) -> Result<(), PinError>;

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) -> Result<(), PinError> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}

/// Digital input pin
///
/// Takes `&mut self` because some platforms reopen a file per read.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> Result<bool, PinError>;

    /// Check if the pin reads low (logic 0)
    fn is_low(&mut self) -> Result<bool, PinError> {
        self.is_high().map(|high| !high)
    }
}

/// Pin that can be used for both input and output
///
/// The sysfs interface exposes every line this way; the direction is
/// chosen with [`DirectionalPin::set_direction`].
pub trait IoPin: OutputPin + InputPin + DirectionalPin {}

// Blanket implementation for types that implement all three traits
impl<T: OutputPin + InputPin + DirectionalPin> IoPin for T {}
