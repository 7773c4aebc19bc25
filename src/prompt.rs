//! Warning confirmation
//!
//! Risky-but-valid settings (huge canvases, tiny tiles, overwriting an
//! existing output) ask the user before continuing, unless warnings are
//! ignored for the whole run.

use std::io::{self, BufRead, Write};

/// How many invalid answers are tolerated before giving up.
pub const MAX_PROMPT_ATTEMPTS: usize = 3;

/// Whether warnings require confirmation. Passed explicitly to every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WarningPolicy {
    pub ignore_warnings: bool,
}

impl WarningPolicy {
    pub fn new(ignore_warnings: bool) -> Self {
        Self { ignore_warnings }
    }
}

/// Outcome of a warning prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Proceed,
    Abort,
}

/// Ask the user whether to continue despite a warning.
///
/// Accepts `y` or `n` in either case. Any other answer re-prompts, up to
/// [`MAX_PROMPT_ATTEMPTS`] times in total; running out of attempts or
/// reaching end of input aborts.
///
/// # Examples
///
/// ```
/// use fmcollage::prompt::{confirm, Confirmation, WarningPolicy};
///
/// let mut out = Vec::new();
/// let answer = confirm("The album size is set very small", WarningPolicy::default(), &b"maybe\ny\n"[..], &mut out).unwrap();
/// assert_eq!(answer, Confirmation::Proceed);
/// ```
pub fn confirm<R: BufRead, W: Write>(
    message: &str,
    policy: WarningPolicy,
    mut input: R,
    mut output: W,
) -> io::Result<Confirmation> {
    if policy.ignore_warnings {
        return Ok(Confirmation::Proceed);
    }

    for _ in 0..MAX_PROMPT_ATTEMPTS {
        write!(output, "Warning: {}. Continue anyway? (Y/n) > ", message)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(Confirmation::Abort);
        }

        match line.trim().to_ascii_uppercase().as_str() {
            "Y" => return Ok(Confirmation::Proceed),
            "N" => return Ok(Confirmation::Abort),
            _ => writeln!(output, "Invalid input. Please enter Y or N")?,
        }
    }

    Ok(Confirmation::Abort)
}

/// [`confirm`] against the process's stdin and stderr.
pub fn confirm_stdio(message: &str, policy: WarningPolicy) -> io::Result<Confirmation> {
    confirm(message, policy, io::stdin().lock(), io::stderr())
}
