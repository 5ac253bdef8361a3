//! Sensor drivers for the theremin controller
//!
//! Drivers are generic over the pin traits of `theremin-hal` and run as
//! continuation chains on the `theremin-core` scheduler:
//!
//! - Ultrasonic range finder (HC-SR04 pulse/echo protocol)
//! - Median filter over echo samples
//!
//! Unlike the core crates this one links `std`: distance conversion needs
//! floating point square roots.

#![deny(unsafe_code)]

pub mod sensor;

pub use sensor::{RangingStats, UltrasonicSensor};
