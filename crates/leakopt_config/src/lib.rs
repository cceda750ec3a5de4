//! Parsing and validation of `leakopt.toml` optimizer configuration files.
//!
//! The configuration declares the threshold-voltage ladder, the library
//! transition table (which library a cell moves to and how its reference
//! name is rewritten), and the recipe knobs that drive strategy selection
//! and the time budget.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
