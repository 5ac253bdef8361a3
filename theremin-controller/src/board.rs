//! Board wiring
//!
//! A [`Board`] turns the two sensor configurations into concrete pins and
//! a clock. It is moved onto the sensor thread and opened there, so the
//! pins and scheduler never cross threads.

use std::path::PathBuf;

use theremin_core::config::SensorConfig;
use theremin_hal::{Clock, DirectionalPin, InputPin, OutputPin, PinError};
use theremin_hal_linux::{SysfsPin, SystemClock};

/// Trigger and echo of one sensor
pub struct PinPair<T, E> {
    pub trigger: T,
    pub echo: E,
}

/// Everything the sensor thread needs from the hardware
pub struct Wiring<T, E, C> {
    pub volume: PinPair<T, E>,
    pub pitch: PinPair<T, E>,
    pub clock: C,
}

/// Source of pins and time for the sensor thread
pub trait Board: Send + 'static {
    type Trigger: OutputPin + DirectionalPin + 'static;
    type Echo: InputPin + DirectionalPin + 'static;
    type Clock: Clock + 'static;

    /// Acquire the pins of both sensors (called on the sensor thread)
    fn open(
        self,
        volume: &SensorConfig,
        pitch: &SensorConfig,
    ) -> Result<Wiring<Self::Trigger, Self::Echo, Self::Clock>, PinError>;
}

/// sysfs GPIO and the system clock
#[derive(Debug, Clone)]
pub struct LinuxBoard {
    gpio_root: PathBuf,
}

impl LinuxBoard {
    /// Board using the sysfs tree at `gpio_root`
    pub fn new(gpio_root: impl Into<PathBuf>) -> Self {
        Self {
            gpio_root: gpio_root.into(),
        }
    }

    fn pair(&self, config: &SensorConfig) -> Result<PinPair<SysfsPin, SysfsPin>, PinError> {
        Ok(PinPair {
            trigger: SysfsPin::export_at(&self.gpio_root, config.trigger_pin)?,
            echo: SysfsPin::export_at(&self.gpio_root, config.echo_pin)?,
        })
    }
}

impl Board for LinuxBoard {
    type Trigger = SysfsPin;
    type Echo = SysfsPin;
    type Clock = SystemClock;

    fn open(
        self,
        volume: &SensorConfig,
        pitch: &SensorConfig,
    ) -> Result<Wiring<SysfsPin, SysfsPin, SystemClock>, PinError> {
        Ok(Wiring {
            volume: self.pair(volume)?,
            pitch: self.pair(pitch)?,
            clock: SystemClock::new(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_linux_board_exports_all_pins() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("export"), "").unwrap();
        fs::write(root.path().join("unexport"), "").unwrap();
        for pin in [19, 26, 6, 13] {
            let dir = root.path().join(format!("gpio{}", pin));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("direction"), "in").unwrap();
            fs::write(dir.join("value"), "0").unwrap();
        }

        let board = LinuxBoard::new(root.path());
        let wiring = board
            .open(&SensorConfig::new(19, 26), &SensorConfig::new(6, 13))
            .unwrap();
        assert_eq!(wiring.volume.trigger.pin(), 19);
        assert_eq!(wiring.volume.echo.pin(), 26);
        assert_eq!(wiring.pitch.trigger.pin(), 6);
        assert_eq!(wiring.pitch.echo.pin(), 13);
    }

    #[test]
    fn test_linux_board_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let board = LinuxBoard::new(root.path().join("absent"));
        let result = board.open(&SensorConfig::new(19, 26), &SensorConfig::new(6, 13));
        assert!(matches!(result, Err(PinError::Unavailable(19))));
    }
}
