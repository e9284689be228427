//! Parsing and validation of `vcdx.toml` configuration files.
//!
//! Every section is optional: a missing file or an empty one yields
//! [`VcdxConfig::default`], which reproduces the classic transcoder behavior.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
