//! The collage run: confirm warnings, refresh tiles if needed, compose, save

use std::io;
use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::config::Resolved;
use crate::error::CollageError;
use crate::output::save_collage;
use crate::pipeline::{now_unix, CollageRun, PipelineError};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::prompt::{Confirmation, WarningPolicy};
use crate::provider::{HttpClient, LastFmClient, ProviderError};

const OVERWRITE_WARNING: &str = "The output image exists already and will be overwritten";

/// How a run ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The collage was written to this path
    Saved(PathBuf),
    /// The user declined a warning
    Aborted,
}

/// Process-level collaborators of a run.
pub struct Session<'a> {
    /// Directory searched for `apikey.txt`
    pub key_dir: PathBuf,
    pub progress: &'a dyn ProgressReporter,
    /// Asks the user about one warning
    pub confirm: &'a mut dyn FnMut(&str, WarningPolicy) -> io::Result<Confirmation>,
}

impl Session<'_> {
    fn confirm(&mut self, message: &str, policy: WarningPolicy) -> Result<Confirmation, CollageError> {
        let answer = (self.confirm)(message, policy)?;
        if answer == Confirmation::Abort {
            info!(warning = message, "run declined by user");
        }
        Ok(answer)
    }
}

/// Execute one collage run.
///
/// `connect` builds the provider client from the API key; it is only called
/// when the stored tiles have to be refreshed.
pub fn run_collage<C, F>(
    resolved: Resolved,
    session: &mut Session<'_>,
    connect: F,
) -> Result<Outcome, CollageError>
where
    C: HttpClient,
    F: FnOnce(String) -> Result<LastFmClient<C>, ProviderError>,
{
    let started = Instant::now();
    let Resolved { options, warnings } = resolved;

    for warning in &warnings {
        if session.confirm(warning, options.policy)? == Confirmation::Abort {
            return Ok(Outcome::Aborted);
        }
    }

    let run = CollageRun::new(&options, session.progress)?;
    let now = now_unix();
    match run.refresh_reason(now)? {
        Some(reason) => {
            info!(%reason, "updating stored images");
            let api_key = options.api_key(&session.key_dir)?;
            let client = connect(api_key).map_err(PipelineError::from)?;
            run.acquire(&client, now)?;
        }
        None => info!(dir = %run.store().dir().display(), "reusing stored images"),
    }

    let image = run.compose()?;

    if options.output_path.exists()
        && session.confirm(OVERWRITE_WARNING, options.policy)? == Confirmation::Abort
    {
        return Ok(Outcome::Aborted);
    }
    save_collage(&image, &options.output_path, &options.encode)?;

    session.progress.report(ProgressEvent::Finished { elapsed: started.elapsed() });
    Ok(Outcome::Saved(options.output_path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheMetadata, RefreshMode};
    use crate::config::{resolve, CliOptions, ConfigError, FileConfig};
    use crate::progress::NullProgress;
    use crate::provider::{MockHttpClient, API_ROOT};
    use crate::store::TileStore;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn png(shade: u8) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([shade, 0, 0])));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn cli(temp: &TempDir) -> CliOptions {
        CliOptions {
            user: "someone".to_string(),
            width: 20,
            height: 20,
            size: Some(10),
            output: Some(temp.path().join("out.png").display().to_string()),
            images_dir: Some(temp.path().join("images")),
            ..Default::default()
        }
    }

    fn seed_store(temp: &TempDir, user: &str) {
        let store = TileStore::open(temp.path().join("images")).unwrap();
        for rank in 0..4 {
            store.write_tile(rank, &png(50 * (rank as u8 + 1))).unwrap();
        }
        store
            .write_metadata(&CacheMetadata {
                captured_at: now_unix(),
                subject_id: user.to_string(),
                period_key: "overall".to_string(),
                tile_count: 4,
            })
            .unwrap();
    }

    fn no_network(_: String) -> Result<LastFmClient<MockHttpClient>, ProviderError> {
        panic!("stored images should have been reused");
    }

    #[test]
    fn test_reuses_fresh_store() {
        let temp = TempDir::new().unwrap();
        seed_store(&temp, "someone");

        let resolved = resolve(cli(&temp), &FileConfig::default()).unwrap();
        let mut asked = Vec::new();
        let mut confirm = |message: &str, _: WarningPolicy| -> io::Result<Confirmation> {
            asked.push(message.to_string());
            Ok(Confirmation::Proceed)
        };
        let mut session =
            Session { key_dir: temp.path().to_path_buf(), progress: &NullProgress, confirm: &mut confirm };

        let outcome = run_collage(resolved, &mut session, no_network).unwrap();

        let path = temp.path().join("out.png");
        assert_eq!(outcome, Outcome::Saved(path.clone()));
        assert_eq!(asked, vec!["The album size is set very small"]);
        assert_eq!(image::open(path).unwrap().to_rgb8().dimensions(), (20, 20));
    }

    #[test]
    fn test_refreshes_for_new_user() {
        let temp = TempDir::new().unwrap();
        seed_store(&temp, "somebody-else");

        let body = r##"{"topalbums": {"album": [
            {"name": "A", "image": [{"size": "extralarge", "#text": "http://img/a.png"}]},
            {"name": "B", "image": [{"size": "extralarge", "#text": "http://img/b.png"}]},
            {"name": "C", "image": [{"size": "extralarge", "#text": "http://img/c.png"}]},
            {"name": "D", "image": [{"size": "extralarge", "#text": "http://img/d.png"}]}
        ]}}"##;
        let mock = MockHttpClient::default()
            .with(API_ROOT, 200, body)
            .with("http://img/", 200, png(7));

        let mut options = cli(&temp);
        options.apikey = Some(KEY.to_string());
        options.ignore_warnings = true;
        let resolved = resolve(options, &FileConfig::default()).unwrap();

        let mut confirm = |_: &str, _: WarningPolicy| -> io::Result<Confirmation> { Ok(Confirmation::Proceed) };
        let mut session =
            Session { key_dir: temp.path().to_path_buf(), progress: &NullProgress, confirm: &mut confirm };
        let mut used_key = None;
        let outcome = run_collage(resolved, &mut session, |key| {
            used_key = Some(key.clone());
            Ok(LastFmClient::new(mock, key))
        })
        .unwrap();

        assert!(matches!(outcome, Outcome::Saved(_)));
        assert_eq!(used_key.as_deref(), Some(KEY));
        let metadata = TileStore::open(temp.path().join("images")).unwrap().read_metadata().unwrap();
        assert_eq!(metadata.unwrap().subject_id, "someone");
    }

    #[test]
    fn test_declined_warning_aborts_before_work() {
        let temp = TempDir::new().unwrap();
        let resolved = resolve(cli(&temp), &FileConfig::default()).unwrap();
        let mut confirm = |_: &str, _: WarningPolicy| -> io::Result<Confirmation> { Ok(Confirmation::Abort) };
        let mut session =
            Session { key_dir: temp.path().to_path_buf(), progress: &NullProgress, confirm: &mut confirm };

        let outcome = run_collage(resolved, &mut session, no_network).unwrap();

        assert_eq!(outcome, Outcome::Aborted);
        assert!(!temp.path().join("images").exists());
    }

    #[test]
    fn test_declined_overwrite_keeps_existing_output() {
        let temp = TempDir::new().unwrap();
        seed_store(&temp, "someone");
        std::fs::write(temp.path().join("out.png"), b"keep me").unwrap();

        let mut options = cli(&temp);
        options.size = Some(40);
        options.width = 80;
        options.height = 80;
        let resolved = resolve(options, &FileConfig::default()).unwrap();
        assert!(resolved.warnings.is_empty());

        let mut asked = Vec::new();
        let mut confirm = |message: &str, _: WarningPolicy| -> io::Result<Confirmation> {
            asked.push(message.to_string());
            Ok(Confirmation::Abort)
        };
        let mut session =
            Session { key_dir: temp.path().to_path_buf(), progress: &NullProgress, confirm: &mut confirm };

        let outcome = run_collage(resolved, &mut session, no_network).unwrap();

        assert_eq!(outcome, Outcome::Aborted);
        assert_eq!(asked, vec![OVERWRITE_WARNING]);
        assert_eq!(std::fs::read(temp.path().join("out.png")).unwrap(), b"keep me");
    }

    #[test]
    fn test_refresh_without_api_key_fails() {
        let temp = TempDir::new().unwrap();
        let mut options = cli(&temp);
        options.update_images = Some(RefreshMode::Yes);
        options.ignore_warnings = true;
        let resolved = resolve(options, &FileConfig::default()).unwrap();

        let mut confirm = |_: &str, _: WarningPolicy| -> io::Result<Confirmation> { Ok(Confirmation::Proceed) };
        let mut session =
            Session { key_dir: temp.path().to_path_buf(), progress: &NullProgress, confirm: &mut confirm };

        let err = run_collage(resolved, &mut session, no_network).unwrap_err();
        assert!(matches!(err, CollageError::Config(ConfigError::MissingApiKey)));
    }
}
