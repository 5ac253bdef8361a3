//! Ultrasonic sensor configuration
//!
//! One `SensorConfig` describes one trigger/echo pair. Values are checked
//! once, when a driver is constructed from them, never mid-measurement.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum samples accumulated per read (median filter window)
pub const MAX_SAMPLES: usize = 64;

/// Default samples per read
pub const DEFAULT_SAMPLES: u32 = 10;

/// Default expected ambient temperature (°C)
pub const DEFAULT_TEMPERATURE_C: f64 = 20.0;

/// Default maximum detectable distance (m)
pub const DEFAULT_MAX_DISTANCE_M: f64 = 2.0;

/// Largest accepted maximum distance (m)
///
/// Far beyond what any ultrasonic ranger resolves. Keeps the derived echo
/// timeouts representable as `Duration`.
pub const MAX_DISTANCE_LIMIT_M: f64 = 50.0;

/// Absolute zero (°C)
const ABSOLUTE_ZERO_C: f64 = -273.15;

/// Reasons a sensor configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample count is zero or exceeds [`MAX_SAMPLES`]
    InvalidSampleCount(u32),
    /// Maximum distance is not positive or exceeds [`MAX_DISTANCE_LIMIT_M`]
    InvalidMaxDistance(f64),
    /// Expected temperature is at or below absolute zero, or not finite
    InvalidTemperature(f64),
    /// Trigger and echo are wired to the same pin
    SharedPin(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleCount(n) => {
                write!(f, "sample count {} outside 1..={}", n, MAX_SAMPLES)
            }
            ConfigError::InvalidMaxDistance(d) => {
                write!(f, "max distance {} m outside (0, {}]", d, MAX_DISTANCE_LIMIT_M)
            }
            ConfigError::InvalidTemperature(t) => write!(f, "temperature {} °C is not physical", t),
            ConfigError::SharedPin(pin) => write!(f, "trigger and echo both use gpio {}", pin),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Ultrasonic sensor configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorConfig {
    /// GPIO driving the trigger input of the sensor
    pub trigger_pin: u32,
    /// GPIO sampling the echo output of the sensor
    pub echo_pin: u32,
    /// Pulse/echo samples taken per read (median filtered)
    #[cfg_attr(feature = "serde", serde(default = "default_samples"))]
    pub samples: u32,
    /// Expected ambient temperature in °C (sets the speed of sound)
    #[cfg_attr(feature = "serde", serde(default = "default_temperature"))]
    pub expected_temperature_c: f64,
    /// Maximum detectable distance in metres (sets the echo timeout)
    #[cfg_attr(feature = "serde", serde(default = "default_max_distance"))]
    pub max_distance_m: f64,
}

#[cfg(feature = "serde")]
fn default_samples() -> u32 {
    DEFAULT_SAMPLES
}

#[cfg(feature = "serde")]
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE_C
}

#[cfg(feature = "serde")]
fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE_M
}

impl SensorConfig {
    /// Create a configuration for the given pins with default parameters
    pub fn new(trigger_pin: u32, echo_pin: u32) -> Self {
        Self {
            trigger_pin,
            echo_pin,
            samples: DEFAULT_SAMPLES,
            expected_temperature_c: DEFAULT_TEMPERATURE_C,
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
        }
    }

    /// Set the trigger pin
    pub fn with_trigger_pin(mut self, pin: u32) -> Self {
        self.trigger_pin = pin;
        self
    }

    /// Set the echo pin
    pub fn with_echo_pin(mut self, pin: u32) -> Self {
        self.echo_pin = pin;
        self
    }

    /// Set the number of samples per read
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Set the expected ambient temperature in °C
    pub fn with_expected_temperature(mut self, celsius: f64) -> Self {
        self.expected_temperature_c = celsius;
        self
    }

    /// Set the maximum detectable distance in metres
    pub fn with_max_distance(mut self, metres: f64) -> Self {
        self.max_distance_m = metres;
        self
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 || self.samples as usize > MAX_SAMPLES {
            return Err(ConfigError::InvalidSampleCount(self.samples));
        }

        if !self.max_distance_m.is_finite()
            || self.max_distance_m <= 0.0
            || self.max_distance_m > MAX_DISTANCE_LIMIT_M
        {
            return Err(ConfigError::InvalidMaxDistance(self.max_distance_m));
        }

        if !self.expected_temperature_c.is_finite()
            || self.expected_temperature_c <= ABSOLUTE_ZERO_C
        {
            return Err(ConfigError::InvalidTemperature(self.expected_temperature_c));
        }

        if self.trigger_pin == self.echo_pin {
            return Err(ConfigError::SharedPin(self.trigger_pin));
        }

        Ok(())
    }
}
