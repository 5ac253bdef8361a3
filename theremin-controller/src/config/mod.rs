//! Configuration loading
//!
//! The controller reads a TOML file given on the command line, or falls back
//! to the defaults compiled into the binary.

pub mod toml;

pub use self::toml::{ChannelConfig, ConfigError, ControllerConfig, LoopConfig};

/// Embedded default configuration (compiled into the binary)
/// Edit theremin.toml and rebuild to change the defaults
pub const EMBEDDED_CONFIG: &str = include_str!("../../theremin.toml");
