//! Tool configuration for the Veles shell.
//!
//! Settings come from an optional `veles.toml` next to the working
//! directory or under `VELES_HOME`, with defaults matching the reference
//! pass parameters.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{home_dir, load_config, load_config_from_str};
pub use types::{OptimizerConfig, ToolConfig};
