//! sysfs GPIO
//!
//! Each pin is exported by writing its number to `<root>/export`, driven
//! through `<root>/gpioN/direction` and `<root>/gpioN/value`, and unexported
//! again on drop.
//!
//! Right after export the attribute files may exist before udev has fixed
//! their permissions, so opening them is retried a bounded number of times.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use theremin_hal::{DirectionalPin, InputPin, OutputPin, PinDirection, PinError};

/// Mount point of the kernel's GPIO class
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// Attempts to open an attribute before giving up
const OPEN_ATTEMPTS: u32 = 20;

/// Pause between attempts
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(5);

/// GPIO line exported through sysfs
#[derive(Debug)]
pub struct SysfsPin {
    pin: u32,
    root: PathBuf,
    direction: PathBuf,
    value: PathBuf,
}

impl SysfsPin {
    /// Export `pin` under `root`, normally [`DEFAULT_SYSFS_ROOT`]
    pub fn export_at(root: impl Into<PathBuf>, pin: u32) -> Result<Self, PinError> {
        let root = root.into();
        let dir = root.join(format!("gpio{}", pin));

        if let Err(e) = write_once(&root.join("export"), &pin.to_string()) {
            // EBUSY when a previous run left the pin exported
            if dir.is_dir() {
                debug!("gpio {} already exported", pin);
            } else {
                warn!("cannot export gpio {}: {}", pin, e);
                return Err(PinError::Unavailable(pin));
            }
        }

        debug!("exported gpio {} under {}", pin, root.display());
        Ok(Self {
            pin,
            direction: dir.join("direction"),
            value: dir.join("value"),
            root,
        })
    }

    /// GPIO number
    pub fn pin(&self) -> u32 {
        self.pin
    }

    fn open(&self, path: &Path, write: bool) -> Result<File, PinError> {
        let mut options = OpenOptions::new();
        options.read(!write).write(write).truncate(write);

        let mut attempt = 1;
        loop {
            match options.open(path) {
                Ok(file) => return Ok(file),
                Err(e) if attempt >= OPEN_ATTEMPTS => {
                    warn!("gpio {}: cannot open {}: {}", self.pin, path.display(), e);
                    return Err(PinError::Unavailable(self.pin));
                }
                Err(_) => {
                    attempt += 1;
                    thread::sleep(OPEN_RETRY_DELAY);
                }
            }
        }
    }

    fn write_attr(&self, path: &Path, contents: &str) -> Result<(), PinError> {
        self.open(path, true)?
            .write_all(contents.as_bytes())
            .map_err(|_| PinError::Io(self.pin))
    }
}

fn write_once(path: &Path, contents: &str) -> std::io::Result<()> {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)?
        .write_all(contents.as_bytes())
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = write_once(&self.root.join("unexport"), &self.pin.to_string()) {
            warn!("cannot unexport gpio {}: {}", self.pin, e);
        }
    }
}

impl DirectionalPin for SysfsPin {
    fn set_direction(&mut self, direction: PinDirection) -> Result<(), PinError> {
        self.write_attr(&self.direction, direction.as_str())
    }
}

impl OutputPin for SysfsPin {
    fn set_high(&mut self) -> Result<(), PinError> {
        self.write_attr(&self.value, "1")
    }

    fn set_low(&mut self) -> Result<(), PinError> {
        self.write_attr(&self.value, "0")
    }
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, PinError> {
        let mut raw = String::new();
        self.open(&self.value, false)?
            .read_to_string(&mut raw)
            .map_err(|_| PinError::Io(self.pin))?;

        match raw.trim() {
            "" => Err(PinError::InvalidValue(self.pin)),
            level => Ok(level != "0"),
        }
    }
}

impl embedded_hal::digital::ErrorType for SysfsPin {
    type Error = PinError;
}

impl embedded_hal::digital::OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), PinError> {
        OutputPin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), PinError> {
        OutputPin::set_high(self)
    }
}

impl embedded_hal::digital::InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, PinError> {
        InputPin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, PinError> {
        InputPin::is_high(self).map(|high| !high)
    }
}
