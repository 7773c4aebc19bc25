//! Top-level error type for a collage run

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::output::OutputError;
use crate::pipeline::PipelineError;

/// Anything that stops a run.
#[derive(Debug, Error)]
pub enum CollageError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Failed to save collage: {0}")]
    Output(#[from] OutputError),
    #[error("Failed to read from the terminal: {0}")]
    Io(#[from] io::Error),
}

impl CollageError {
    /// Whether the error comes from a bad command-line or config value.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            CollageError::Config(ConfigError::InvalidOption(_) | ConfigError::Validation(_))
        )
    }
}
