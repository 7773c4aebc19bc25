//! Configuration loading and discovery for `fmcollage.toml`
//!
//! Provides functions to find and load the optional config file, and to read
//! the API key from `apikey.txt`.

use super::schema::FileConfig;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file searched for.
pub const CONFIG_FILE: &str = "fmcollage.toml";

/// Name of the plain-text API key file.
pub const API_KEY_FILE: &str = "apikey.txt";

/// Length of a Last.fm API key.
pub const API_KEY_LEN: usize = 32;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
    /// TOML parsing error
    #[error("Failed to parse fmcollage.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// A command-line option is out of range
    #[error("{0}")]
    InvalidOption(String),
    /// No API key in any of the places it is looked up
    #[error("No API key found. Put your Last.fm key in apikey.txt or fmcollage.toml, or pass it with --apikey")]
    MissingApiKey,
}

/// Find fmcollage.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for fmcollage.toml
/// 2. Check XDG_CONFIG_HOME/fmcollage/fmcollage.toml (or ~/.config/fmcollage/fmcollage.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find fmcollage.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("fmcollage").join(CONFIG_FILE);
    config_path.exists().then_some(config_path)
}

/// Find fmcollage.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from an explicit path, or from the discovered file.
///
/// Returns an empty configuration when no file is found. An explicit path
/// that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(FileConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Read the API key from `apikey.txt` in `dir`.
///
/// Only the first 32 characters are used, so a trailing newline is harmless.
/// Returns `Ok(None)` when the file does not exist.
pub fn read_api_key_file(dir: &Path) -> Result<Option<String>, ConfigError> {
    let path = dir.join(API_KEY_FILE);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents.chars().take(API_KEY_LEN).collect())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::Io(e)),
    }
}

/// Check that an API key has the expected length.
pub fn validate_api_key(key: &str) -> Result<(), ConfigError> {
    if key.chars().count() != API_KEY_LEN {
        return Err(ConfigError::InvalidOption(format!(
            "The entered API key is invalid. It must be {} characters long",
            API_KEY_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_find_config_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "").unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_from(nested), Some(temp.path().join(CONFIG_FILE)));
    }

    #[test]
    #[serial]
    fn test_find_xdg_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fmcollage");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), "").unwrap();

        let previous = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", temp.path());
        let found = find_xdg_config();
        match previous {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(found, Some(dir.join(CONFIG_FILE)));
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, format!("api_key = \"{}\"\n[defaults]\nsize = 64\n", KEY)).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api_key.as_deref(), Some(KEY));
        assert_eq!(config.defaults.size, Some(64));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[defaults]\npng_compression = 11\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("defaults.png_compression"));
    }

    #[test]
    fn test_read_api_key_file_truncates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(API_KEY_FILE), format!("{}\n", KEY)).unwrap();
        assert_eq!(read_api_key_file(temp.path()).unwrap().as_deref(), Some(KEY));
    }

    #[test]
    fn test_read_api_key_file_missing() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_api_key_file(temp.path()).unwrap(), None);
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key(KEY).is_ok());
        assert!(matches!(validate_api_key("abc"), Err(ConfigError::InvalidOption(_))));
    }
}
