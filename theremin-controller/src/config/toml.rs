//! TOML controller configuration
//!
//! ```toml
//! [controller]
//! stop_poll_ms = 100
//! report_ms = 250
//!
//! [volume]
//! trigger_pin = 19
//! echo_pin = 26
//! min_distance = 0.06
//! max_distance = 0.4
//!
//! [pitch]
//! trigger_pin = 6
//! echo_pin = 13
//! ```
//!
//! Omitted sensor parameters fall back to the `SensorConfig` defaults,
//! except `max_distance_m`, which defaults to the channel's `max_distance`:
//! a hand beyond the playing range reads as no hand at all.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use theremin_core::config::{self as core_config, SensorConfig};
use theremin_hal_linux::DEFAULT_SYSFS_ROOT;

use super::EMBEDDED_CONFIG;

/// Default hand distance mapped to 0.0 (m)
pub const DEFAULT_MIN_DISTANCE_M: f64 = 0.06;

/// Default hand distance mapped to 1.0 (m)
pub const DEFAULT_MAX_DISTANCE_M: f64 = 0.4;

/// Default stop-request poll interval (ms)
pub const DEFAULT_STOP_POLL_MS: u64 = 100;

/// Default report interval (ms)
pub const DEFAULT_REPORT_MS: u64 = 250;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration")]
    Parse(#[from] ::toml::de::Error),

    #[error("[{channel}] sensor configuration rejected")]
    Sensor {
        channel: &'static str,
        #[source]
        source: core_config::ConfigError,
    },

    #[error("[{channel}] distance range {min}..{max} m is empty or negative")]
    InvalidRange {
        channel: &'static str,
        min: f64,
        max: f64,
    },

    #[error("gpio {0} is wired to both sensors")]
    PinConflict(u32),

    #[error("[controller] {0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// One ranging channel: sensor wiring plus normalisation range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChannelSection")]
pub struct ChannelConfig {
    #[serde(flatten)]
    pub sensor: SensorConfig,
    /// Hand distance mapped to 0.0 (m)
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    /// Hand distance mapped to 1.0 (m)
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
}

/// `[volume]` / `[pitch]` as written, before the echo timeout is derived
#[derive(Deserialize)]
struct ChannelSection {
    trigger_pin: u32,
    echo_pin: u32,
    #[serde(default = "default_samples")]
    samples: u32,
    #[serde(default = "default_temperature")]
    expected_temperature_c: f64,
    max_distance_m: Option<f64>,
    #[serde(default = "default_min_distance")]
    min_distance: f64,
    #[serde(default = "default_max_distance")]
    max_distance: f64,
}

impl From<ChannelSection> for ChannelConfig {
    fn from(raw: ChannelSection) -> Self {
        let sensor = SensorConfig::new(raw.trigger_pin, raw.echo_pin)
            .with_samples(raw.samples)
            .with_expected_temperature(raw.expected_temperature_c)
            .with_max_distance(raw.max_distance_m.unwrap_or(raw.max_distance));

        Self {
            sensor,
            min_distance: raw.min_distance,
            max_distance: raw.max_distance,
        }
    }
}

fn default_samples() -> u32 {
    core_config::DEFAULT_SAMPLES
}

fn default_temperature() -> f64 {
    core_config::DEFAULT_TEMPERATURE_C
}

fn default_min_distance() -> f64 {
    DEFAULT_MIN_DISTANCE_M
}

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE_M
}

impl ChannelConfig {
    fn validate(&self, channel: &'static str) -> Result<(), ConfigError> {
        self.sensor
            .validate()
            .map_err(|source| ConfigError::Sensor { channel, source })?;

        let (min, max) = (self.min_distance, self.max_distance);
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || max <= min {
            return Err(ConfigError::InvalidRange { channel, min, max });
        }
        Ok(())
    }
}

/// Scheduler loop and process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Stop-request poll interval (ms)
    #[serde(default = "default_stop_poll_ms")]
    pub stop_poll_ms: u64,
    /// Volume/pitch report interval (ms)
    #[serde(default = "default_report_ms")]
    pub report_ms: u64,
    /// sysfs GPIO mount point
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
}

fn default_stop_poll_ms() -> u64 {
    DEFAULT_STOP_POLL_MS
}

fn default_report_ms() -> u64 {
    DEFAULT_REPORT_MS
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from(DEFAULT_SYSFS_ROOT)
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            stop_poll_ms: DEFAULT_STOP_POLL_MS,
            report_ms: DEFAULT_REPORT_MS,
            gpio_root: default_gpio_root(),
        }
    }
}

impl LoopConfig {
    /// Stop-request poll interval
    pub fn stop_poll(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms)
    }

    /// Report interval
    pub fn report(&self) -> Duration {
        Duration::from_millis(self.report_ms)
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub controller: LoopConfig,
    pub volume: ChannelConfig,
    pub pitch: ChannelConfig,
}

impl ControllerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ::toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or the embedded defaults when `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Self::from_toml(EMBEDDED_CONFIG),
        }
    }

    /// Check every section and the pin assignment across sensors
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.volume.validate("volume")?;
        self.pitch.validate("pitch")?;

        let volume = [self.volume.sensor.trigger_pin, self.volume.sensor.echo_pin];
        let pitch = [self.pitch.sensor.trigger_pin, self.pitch.sensor.echo_pin];
        if let Some(&pin) = volume.iter().find(|pin| pitch.contains(pin)) {
            return Err(ConfigError::PinConflict(pin));
        }

        if self.controller.stop_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("stop_poll_ms"));
        }
        if self.controller.report_ms == 0 {
            return Err(ConfigError::ZeroInterval("report_ms"));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ::toml::ser::Error> {
        ::toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [volume]
        trigger_pin = 19
        echo_pin = 26

        [pitch]
        trigger_pin = 6
        echo_pin = 13
    "#;

    fn channel(trigger_pin: u32, echo_pin: u32) -> ChannelConfig {
        ChannelConfig {
            sensor: SensorConfig::new(trigger_pin, echo_pin)
                .with_max_distance(DEFAULT_MAX_DISTANCE_M),
            min_distance: DEFAULT_MIN_DISTANCE_M,
            max_distance: DEFAULT_MAX_DISTANCE_M,
        }
    }

    #[test]
    fn test_embedded_defaults() {
        let config = ControllerConfig::load(None).unwrap();

        assert_eq!(config.volume.sensor.trigger_pin, 19);
        assert_eq!(config.volume.sensor.echo_pin, 26);
        assert_eq!(config.pitch.sensor.trigger_pin, 6);
        assert_eq!(config.pitch.sensor.echo_pin, 13);
        assert_eq!(config.volume.sensor.samples, core_config::DEFAULT_SAMPLES);
        assert_eq!(config.pitch.sensor.expected_temperature_c, 20.0);
        assert_eq!(config.volume.min_distance, 0.06);
        assert_eq!(config.volume.max_distance, 0.4);
        assert_eq!(config.volume.sensor.max_distance_m, 0.4);
        assert_eq!(config.pitch.sensor.max_distance_m, 0.4);
        assert_eq!(config.controller.stop_poll(), Duration::from_millis(100));
    }

    #[test]
    fn test_minimal_uses_defaults() {
        let config = ControllerConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(config.volume, channel(19, 26));
        assert_eq!(config.pitch, channel(6, 13));
        assert_eq!(config.controller, LoopConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ControllerConfig::from_toml(
            r#"
            [controller]
            report_ms = 50

            [volume]
            trigger_pin = 19
            echo_pin = 26
            samples = 5
            max_distance_m = 1.0
            max_distance = 0.3

            [pitch]
            trigger_pin = 6
            echo_pin = 13
            expected_temperature_c = 30.0
        "#,
        )
        .unwrap();

        assert_eq!(config.controller.report(), Duration::from_millis(50));
        assert_eq!(config.controller.stop_poll_ms, DEFAULT_STOP_POLL_MS);
        assert_eq!(config.volume.sensor.samples, 5);
        assert_eq!(config.volume.sensor.max_distance_m, 1.0);
        assert_eq!(config.volume.max_distance, 0.3);
        assert_eq!(config.pitch.sensor.expected_temperature_c, 30.0);
    }

    #[test]
    fn test_echo_timeout_follows_range() {
        let text = MINIMAL.replace("echo_pin = 26", "echo_pin = 26\nmax_distance = 0.3");
        let config = ControllerConfig::from_toml(&text).unwrap();
        assert_eq!(config.volume.sensor.max_distance_m, 0.3);
        assert_eq!(config.pitch.sensor.max_distance_m, DEFAULT_MAX_DISTANCE_M);
    }

    #[test]
    fn test_oversized_max_distance_rejected() {
        let text = MINIMAL.replace("echo_pin = 13", "echo_pin = 13\nmax_distance_m = 1e300");
        let result = ControllerConfig::from_toml(&text);
        assert!(matches!(
            result,
            Err(ConfigError::Sensor {
                channel: "pitch",
                source: core_config::ConfigError::InvalidMaxDistance(_),
            })
        ));
    }

    #[test]
    fn test_missing_section() {
        let result = ControllerConfig::from_toml("[volume]\ntrigger_pin = 19\necho_pin = 26\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_sensor_rejected() {
        let text = MINIMAL.replace("echo_pin = 13", "echo_pin = 13\nsamples = 0");
        let result = ControllerConfig::from_toml(&text);
        assert!(matches!(
            result,
            Err(ConfigError::Sensor {
                channel: "pitch",
                source: core_config::ConfigError::InvalidSampleCount(0),
            })
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let text = MINIMAL.replace("echo_pin = 26", "echo_pin = 26\nmin_distance = 0.5");
        let result = ControllerConfig::from_toml(&text);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRange {
                channel: "volume",
                ..
            })
        ));
    }

    #[test]
    fn test_shared_pin_rejected() {
        let text = MINIMAL.replace("echo_pin = 13", "echo_pin = 26");
        let result = ControllerConfig::from_toml(&text);
        assert!(matches!(result, Err(ConfigError::PinConflict(26))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let text = format!("[controller]\nstop_poll_ms = 0\n{}", MINIMAL);
        let result = ControllerConfig::from_toml(&text);
        assert!(matches!(result, Err(ConfigError::ZeroInterval("stop_poll_ms"))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = ControllerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.pitch.sensor.echo_pin, 13);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ControllerConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_rendered_config_reloads() {
        let config = ControllerConfig::load(None).unwrap();
        let text = config.to_toml().unwrap();
        assert_eq!(ControllerConfig::from_toml(&text).unwrap(), config);
    }
}
