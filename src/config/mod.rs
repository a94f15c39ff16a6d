//! Library and sample-app configuration.
//!
//! Configuration lives in `<config_dir>/mvvmkit/config.toml`. Every field
//! has a default, so a missing file (or a missing section) is not an error.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, DispatcherConfig, LoggingConfig};
