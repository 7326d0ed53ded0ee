//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Listings are the product of a command and always go to stdout.
//! Confirmations such as `deleted ...` lines respect the quiet flag, and
//! diagnostics go to stderr.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Writer for confirmation messages: stdout, or a sink in quiet mode.
pub fn messages(verbosity: Verbosity) -> Box<dyn Write> {
    if verbosity == Verbosity::Quiet {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Units above bytes, in powers of 1024.
const SIZE_UNITS: &[u8] = b"KMGTPE";

/// Format a byte count with 1024-based units.
///
/// ```
/// use docker_registry::ui::output::format_size;
///
/// assert_eq!(format_size(1023), "1023B");
/// assert_eq!(format_size(1024), "1.0KB");
/// assert_eq!(format_size(1536), "1.5KB");
/// assert_eq!(format_size(1048576), "1.0MB");
/// ```
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{}B", size);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!(
        "{:.1}{}B",
        size as f64 / div as f64,
        SIZE_UNITS[exp] as char
    )
}

/// Format a creation time in local time, RFC 3339 to the second.
pub fn format_created(created: &DateTime<Utc>) -> String {
    created
        .with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Width of a column: the longest item, at least `min`.
pub fn column_width<S: AsRef<str>>(items: &[S], min: usize) -> usize {
    items
        .iter()
        .map(|s| s.as_ref().chars().count())
        .fold(min, usize::max)
}
