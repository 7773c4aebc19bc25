//! Resolved run options
//!
//! Merges command-line values with `fmcollage.toml` and built-in defaults,
//! rejects out-of-range values, and collects the warnings the user has to
//! confirm before the run starts.

use std::path::{Path, PathBuf};

use super::loader::{read_api_key_file, validate_api_key, ConfigError};
use super::schema::FileConfig;
use crate::cache::RefreshMode;
use crate::grid::{CanvasSize, GridSpec};
use crate::order::Layout;
use crate::output::{resolve_output_path, EncodeOptions, OutputFormat};
use crate::prompt::WarningPolicy;
use crate::provider::Period;

pub const DEFAULT_TILE_SIZE: u32 = 300;
pub const DEFAULT_OUTPUT: &str = "collage";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_JPEG_QUALITY: u8 = 100;
pub const DEFAULT_PNG_COMPRESSION: u8 = 9;

/// Dimensions above this ask for confirmation
const LARGE_DIMENSION: u32 = 9_999;
/// Dimensions above this are refused
const MAX_DIMENSION: u32 = 99_999;
/// Most covers are served at this size; larger tiles get blurry
const LARGEST_COVER: u32 = 300;
const SMALL_TILE: u32 = 32;
const LOW_JPEG_QUALITY: u8 = 32;

/// User name that stands in for a known account in demos
const EXAMPLE_USER: &str = "example";
const EXAMPLE_USER_TARGET: &str = "jerboa88";

/// Options as given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub user: String,
    pub width: u32,
    pub height: u32,
    pub size: Option<u32>,
    pub apikey: Option<String>,
    pub output: Option<String>,
    pub filetype: Option<OutputFormat>,
    pub jpeg_quality: Option<u8>,
    pub png_compression: Option<u8>,
    pub period: Option<Period>,
    pub layout: Option<Layout>,
    pub update_images: Option<RefreshMode>,
    pub images_dir: Option<PathBuf>,
    pub ignore_warnings: bool,
}

/// Fully resolved settings for one collage run.
#[derive(Debug, Clone)]
pub struct CollageOptions {
    pub user: String,
    pub canvas: CanvasSize,
    pub grid: GridSpec,
    pub period: Period,
    pub layout: Layout,
    pub refresh: RefreshMode,
    pub images_dir: PathBuf,
    pub output_path: PathBuf,
    pub encode: EncodeOptions,
    pub policy: WarningPolicy,
    /// Key from `--apikey` or the config file; `apikey.txt` is read lazily
    api_key: Option<String>,
}

impl CollageOptions {
    /// The API key, falling back to `apikey.txt` in `key_dir`.
    ///
    /// Only needed when tiles have to be fetched.
    pub fn api_key(&self, key_dir: &Path) -> Result<String, ConfigError> {
        let key = match &self.api_key {
            Some(key) => key.clone(),
            None => read_api_key_file(key_dir)?.ok_or(ConfigError::MissingApiKey)?,
        };
        validate_api_key(&key)?;
        Ok(key)
    }
}

/// Options plus the warnings that need confirmation.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub options: CollageOptions,
    pub warnings: Vec<String>,
}

fn invalid(message: String) -> ConfigError {
    ConfigError::InvalidOption(message)
}

fn check_dimension(label: &str, value: u32, warnings: &mut Vec<String>) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(format!("The {} must be greater than 0", label)));
    }
    if value > MAX_DIMENSION {
        return Err(invalid(format!(
            "The {} entered is way too big. The limit is {} pixels",
            label, MAX_DIMENSION
        )));
    }
    if value > LARGE_DIMENSION {
        warnings.push(format!("The {} entered is pretty big. This may take a while", label));
    }
    Ok(())
}

/// Merge and validate options.
///
/// Precedence is command line, then `fmcollage.toml`, then built-in
/// defaults. Hard limits produce [`ConfigError::InvalidOption`]; soft limits
/// are returned as warnings.
pub fn resolve(cli: CliOptions, file: &FileConfig) -> Result<Resolved, ConfigError> {
    let defaults = &file.defaults;
    let mut warnings = Vec::new();

    let user = if cli.user == EXAMPLE_USER { EXAMPLE_USER_TARGET.to_string() } else { cli.user };
    if user.trim().is_empty() {
        return Err(invalid("The user can't be empty".to_string()));
    }

    check_dimension("width", cli.width, &mut warnings)?;
    check_dimension("height", cli.height, &mut warnings)?;

    let api_key = cli.apikey.or_else(|| file.api_key.clone());
    if let Some(key) = &api_key {
        validate_api_key(key)?;
    }

    let tile_size = cli.size.or(defaults.size).unwrap_or(DEFAULT_TILE_SIZE);
    if tile_size == 0 {
        return Err(invalid("The size must be greater than 0".to_string()));
    }
    if tile_size > LARGEST_COVER {
        warnings.push(
            "Most album covers are not larger than 300px so the images may look blurry".to_string(),
        );
    } else if tile_size < SMALL_TILE {
        warnings.push("The album size is set very small".to_string());
    }

    let jpeg_quality =
        cli.jpeg_quality.or(defaults.jpeg_quality).unwrap_or(DEFAULT_JPEG_QUALITY);
    if jpeg_quality > 100 {
        return Err(invalid("JPEG quality cannot be greater than 100".to_string()));
    }
    if jpeg_quality < 1 {
        return Err(invalid("JPEG quality cannot be less than 1".to_string()));
    }
    if jpeg_quality < LOW_JPEG_QUALITY {
        warnings.push("The JPEG quality is set very low".to_string());
    }

    let png_compression =
        cli.png_compression.or(defaults.png_compression).unwrap_or(DEFAULT_PNG_COMPRESSION);
    if png_compression > 9 {
        return Err(invalid("PNG compression cannot be greater than 9".to_string()));
    }

    let canvas = CanvasSize::new(cli.width, cli.height).map_err(|e| invalid(e.to_string()))?;
    let grid = GridSpec::for_canvas(canvas, tile_size).map_err(|e| invalid(e.to_string()))?;

    let requested_format = cli.filetype.or(defaults.filetype).unwrap_or_default();
    let output_name = cli.output.unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let (output_path, format) = resolve_output_path(&output_name, requested_format);

    let options = CollageOptions {
        user,
        canvas,
        grid,
        period: cli.period.or(defaults.period).unwrap_or_default(),
        layout: cli.layout.or(defaults.layout).unwrap_or_default(),
        refresh: cli.update_images.or(defaults.update_images).unwrap_or_default(),
        images_dir: cli
            .images_dir
            .or_else(|| file.images_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
        output_path,
        encode: EncodeOptions { format, jpeg_quality, png_compression },
        policy: WarningPolicy::new(cli.ignore_warnings),
        api_key,
    };

    Ok(Resolved { options, warnings })
}
