//! Configuration schema types for `fmcollage.toml`
//!
//! Every field is optional; anything left out falls back to the command
//! line or the built-in default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::RefreshMode;
use crate::order::Layout;
use crate::output::OutputFormat;
use crate::provider::Period;

/// Root of `fmcollage.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Last.fm API key (32 characters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Directory holding cached tiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<PathBuf>,
    /// Defaults for command-line options
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png_compression: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_images: Option<RefreshMode>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "defaults.jpeg_quality")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fmcollage.toml: '{}' {}", self.field, self.message)
    }
}

impl FileConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut invalid = |field: &str, message: &str| {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                message: message.to_string(),
            });
        };

        if let Some(key) = &self.api_key {
            if key.len() != 32 {
                invalid("api_key", "must be 32 characters long");
            }
        }
        if self.defaults.size == Some(0) {
            invalid("defaults.size", "must be a positive integer");
        }
        if let Some(quality) = self.defaults.jpeg_quality {
            if !(1..=100).contains(&quality) {
                invalid("defaults.jpeg_quality", "must be between 1 and 100");
            }
        }
        if let Some(level) = self.defaults.png_compression {
            if level > 9 {
                invalid("defaults.png_compression", "must be between 0 and 9");
            }
        }

        errors
    }
}
