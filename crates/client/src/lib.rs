//! Composition root for the encounter binary.
//!
//! Loads configuration from the environment (optionally from a RON file),
//! installs logging, and runs the encounter runtime against the sandbox arena.
pub mod config;
pub mod dry_run;
pub mod logging;

pub use config::{ClientConfig, ConfigLoadError};
