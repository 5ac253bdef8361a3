//! Linux platform support for the theremin controller
//!
//! Implements the `theremin-hal` traits on a Linux board (Raspberry Pi and
//! similar):
//!
//! - [`SysfsPin`] - GPIO through the legacy `/sys/class/gpio` interface
//! - [`SystemClock`] - monotonic clock backed by `std::time::Instant`
//!
//! `SysfsPin` also implements the `embedded-hal` 1.0 digital traits so it
//! can be handed to third-party drivers.

#![deny(unsafe_code)]

pub mod clock;
pub mod sysfs;

pub use clock::SystemClock;
pub use sysfs::{SysfsPin, DEFAULT_SYSFS_ROOT};
