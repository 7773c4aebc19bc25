//! Run progress reporting.
//!
//! Long steps (downloading covers, loading tiles) report per-item progress
//! through a [`ProgressReporter`]. The console reporter redraws a single
//! status line; [`NullProgress`] discards everything and is used in tests.
//!
//! # Example
//!
//! ```
//! use fmcollage::progress::{NullProgress, ProgressEvent, ProgressReporter, Stage};
//!
//! let reporter = NullProgress::new();
//! reporter.report(ProgressEvent::StageStarted { stage: Stage::Downloading, total: 4 });
//! reporter.report(ProgressEvent::Step { stage: Stage::Downloading, current: 1, total: 4 });
//! reporter.report(ProgressEvent::StageCompleted { stage: Stage::Downloading });
//! ```

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// A phase of a collage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Paging through the provider's album ranking
    FetchingAlbums,
    /// Downloading cover art into the tile store
    Downloading,
    /// Decoding and resizing stored tiles
    Loading,
    /// Pasting tiles and encoding the output
    Composing,
}

impl Stage {
    /// Label used for per-item status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::FetchingAlbums => "Fetching albums",
            Stage::Downloading => "Fetching image",
            Stage::Loading => "Loading image",
            Stage::Composing => "Processing image",
        }
    }
}

/// Events that can be reported during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A stage began
    StageStarted {
        stage: Stage,
        /// Number of items the stage will process
        total: usize,
    },
    /// One item of a stage finished
    Step {
        stage: Stage,
        /// 1-based index of the finished item
        current: usize,
        total: usize,
    },
    /// A stage finished
    StageCompleted { stage: Stage },
    /// A non-fatal problem worth showing the user
    Warning { message: String },
    /// The whole run finished
    Finished { elapsed: Duration },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    /// Output writer (for testing)
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress").field("use_colors", &self.use_colors).finish()
    }
}

impl ConsoleProgress {
    /// Create a console reporter on stderr, colored when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, output: Mutex::new(Box::new(output)) }
    }

    /// Set whether to use colors.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn write(&self, text: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = write!(output, "{}", text);
            let _ = output.flush();
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted { stage, total } => {
                self.write(&format!("{} {}\n", self.color("[start]", "\x1b[36m"), stage_title(stage, total)));
            }
            ProgressEvent::Step { stage, current, total } => {
                // Redraw in place; the line is closed by StageCompleted
                self.write(&format!("\r{}", status_line(stage.label(), current, total)));
            }
            ProgressEvent::StageCompleted { .. } => {
                self.write(&format!("\n{}\n", self.color("Done", "\x1b[32m")));
            }
            ProgressEvent::Warning { message } => {
                self.write(&format!("{} {}\n", self.color("[warn]", "\x1b[33m"), message));
            }
            ProgressEvent::Finished { elapsed } => {
                self.write(&format!("{}\n", format_elapsed(elapsed)));
            }
        }
    }
}

fn stage_title(stage: Stage, total: usize) -> String {
    match stage {
        Stage::FetchingAlbums => "Fetching favorite albums from Last.fm".to_string(),
        Stage::Downloading => format!("Downloading {} album covers", total),
        Stage::Loading => format!("Loading {} images", total),
        Stage::Composing => "Creating collage".to_string(),
    }
}

/// Format a status line like `Fetching image 3/9 (33.3%)`.
pub fn status_line(label: &str, current: usize, total: usize) -> String {
    let percent = if total == 0 { 100.0 } else { current as f64 * 100.0 / total as f64 };
    format!("{} {}/{} ({:.1}%)", label, current, total, percent)
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{} {}", value, unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

/// Format a run duration, e.g. `Finished in 1 minute and 5 seconds`.
///
/// Hours are only shown when non-zero, likewise minutes when there are no
/// hours.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!(
            "Finished in {}, {}, and {}",
            plural(hours, "hour"),
            plural(minutes, "minute"),
            plural(seconds, "second")
        )
    } else if minutes > 0 {
        format!("Finished in {} and {}", plural(minutes, "minute"), plural(seconds, "second"))
    } else {
        format!("Finished in {}", plural(seconds, "second"))
    }
}
