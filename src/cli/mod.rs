//! Command-line interface implementation
//!
//! This module parses arguments and maps the outcome of a run to an exit
//! code. The run itself lives in [`collage`].

mod collage;

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::cache::RefreshMode;
use crate::config::{load_config, resolve, CliOptions};
use crate::logging::init_logging;
use crate::order::Layout;
use crate::output::OutputFormat;
use crate::progress::ConsoleProgress;
use crate::prompt::confirm_stdio;
use crate::provider::{LastFmClient, Period, ProviderError, ReqwestClient};

pub use collage::{run_collage, Outcome, Session};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Printed when the user declines a warning
pub const ABORT_MESSAGE: &str = "Alrighty. Quitting now";

/// fmcollage - Build a collage of a Last.fm user's most listened albums
#[derive(Parser, Debug)]
#[command(name = "fmcollage")]
#[command(about = "Build a collage of a Last.fm user's most listened albums")]
#[command(version)]
pub struct Cli {
    /// Last.fm user name ("example" uses a demo account)
    pub user: String,

    /// Width of the collage in pixels
    pub width: u32,

    /// Height of the collage in pixels
    pub height: u32,

    /// Side length of each album cover in pixels [default: 300]
    #[arg(short, long)]
    pub size: Option<u32>,

    /// Last.fm API key (otherwise read from fmcollage.toml or apikey.txt)
    #[arg(short = 'k', long)]
    pub apikey: Option<String>,

    /// Output file name; a .jpg or .png extension selects the file type
    #[arg(short, long)]
    pub output: Option<String>,

    /// File type of the collage [default: jpg]
    #[arg(short, long, value_enum)]
    pub filetype: Option<OutputFormat>,

    /// JPEG quality from 1 to 100 [default: 100]
    #[arg(short = 'q', long)]
    pub jpeg_quality: Option<u8>,

    /// PNG compression level from 0 to 9 [default: 9]
    #[arg(short = 'c', long)]
    pub png_compression: Option<u8>,

    /// Listening period to rank albums over [default: forever]
    #[arg(short, long, value_enum)]
    pub period: Option<Period>,

    /// Order in which albums are placed [default: topleft]
    #[arg(short, long, value_enum)]
    pub layout: Option<Layout>,

    /// Whether to download new covers or reuse stored ones [default: auto]
    #[arg(short, long, value_enum)]
    pub update_images: Option<RefreshMode>,

    /// Directory where album covers are stored [default: images]
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Continue past warnings without asking
    #[arg(short, long)]
    pub ignore_warnings: bool,

    /// Path to a config file (default: search for fmcollage.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Command-line values in the form the config resolver takes.
    pub fn options(&self) -> CliOptions {
        CliOptions {
            user: self.user.clone(),
            width: self.width,
            height: self.height,
            size: self.size,
            apikey: self.apikey.clone(),
            output: self.output.clone(),
            filetype: self.filetype,
            jpeg_quality: self.jpeg_quality,
            png_compression: self.png_compression,
            period: self.period,
            layout: self.layout,
            update_images: self.update_images,
            images_dir: self.images_dir.clone(),
            ignore_warnings: self.ignore_warnings,
        }
    }
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let resolved = match resolve(cli.options(), &file_config) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let progress = ConsoleProgress::new();
    let mut ask = confirm_stdio;
    let mut session = Session { key_dir: PathBuf::from("."), progress: &progress, confirm: &mut ask };
    let connect = |api_key: String| -> Result<_, ProviderError> {
        Ok(LastFmClient::new(ReqwestClient::new()?, api_key))
    };

    match run_collage(resolved, &mut session, connect) {
        Ok(Outcome::Saved(path)) => {
            println!("Saved as {}", path.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(Outcome::Aborted) => {
            println!("{}", ABORT_MESSAGE);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_invalid_input() {
                ExitCode::from(EXIT_INVALID_ARGS)
            } else {
                ExitCode::from(EXIT_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["fmcollage", "jerboa88", "1920", "1080"]).unwrap();
        assert_eq!(cli.user, "jerboa88");
        assert_eq!((cli.width, cli.height), (1920, 1080));
        assert_eq!(cli.size, None);
        assert!(!cli.ignore_warnings);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_all_options() {
        let cli = Cli::try_parse_from([
            "fmcollage", "someone", "600", "400", "-s", "100", "-o", "wall", "-f", "png", "-q", "80",
            "-c", "3", "-p", "6month", "-l", "spiral", "-u", "no", "-i", "-vv",
        ])
        .unwrap();

        let options = cli.options();
        assert_eq!(options.size, Some(100));
        assert_eq!(options.output.as_deref(), Some("wall"));
        assert_eq!(options.filetype, Some(OutputFormat::Png));
        assert_eq!(options.jpeg_quality, Some(80));
        assert_eq!(options.png_compression, Some(3));
        assert_eq!(options.period, Some(Period::SixMonths));
        assert_eq!(options.layout, Some(Layout::Spiral));
        assert_eq!(options.update_images, Some(RefreshMode::No));
        assert!(options.ignore_warnings);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Cli::try_parse_from(["fmcollage", "u", "10", "10", "-f", "gif"]).is_err());
        assert!(Cli::try_parse_from(["fmcollage", "u", "10", "10", "-l", "zigzag"]).is_err());
        assert!(Cli::try_parse_from(["fmcollage", "u", "-10", "10"]).is_err());
        assert!(Cli::try_parse_from(["fmcollage", "u", "10"]).is_err());
    }
}
