//! Configuration for a collage run
//!
//! Provides the optional `fmcollage.toml` file, its discovery, and the
//! merging of file values with command-line options.

pub mod loader;
pub mod options;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use options::{resolve, CliOptions, CollageOptions, Resolved};
pub use schema::*;
