//! Configuration types
//!
//! Board-agnostic sensor configuration. The controller binary fills these
//! from its TOML file; tests build them with the `with_*` builder.

pub mod sensor;

pub use sensor::*;
