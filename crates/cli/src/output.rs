//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Errors and warnings go to
//! stderr; everything else goes to stdout and is dropped in quiet mode.

use owo_colors::{OwoColorize, Stream};
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress success, info, header and field output
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

/// Whether non-error output is suppressed
pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        if is_quiet() {
            return;
        }
        println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        if is_quiet() {
            return;
        }
        println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |t| t.blue()), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        if is_quiet() {
            return;
        }
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an indented `label: value` row
    pub fn field(label: &str, value: &str) {
        if is_quiet() {
            return;
        }
        println!(
            "  {} {}",
            format_label(label).if_supports_color(Stream::Stdout, |t| t.dimmed()),
            value
        );
    }
}

/// Pad a label so values line up in a column
pub fn format_label(label: &str) -> String {
    format!("{:<22}", format!("{}:", label))
}

/// Render an enabled/disabled flag
pub fn format_flag(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
