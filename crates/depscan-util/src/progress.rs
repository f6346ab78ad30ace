//! Terminal status output for scans.
//!
//! Everything here writes to stderr so that `--json` output on stdout stays
//! machine-readable.

use std::io::Write;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

fn styled_line(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        style.apply_to(label),
    );
}

/// Print a Cargo-style status line: `    Scanning org.example:app:1.0`
///
/// The `label` is right-aligned to 12 columns in bold green.
pub fn status(label: &str, message: &str) {
    styled_line(Style::new().green().bold(), label, message);
}

/// Like [`status`] but with a bold cyan label, for summaries.
pub fn status_info(label: &str, message: &str) {
    styled_line(Style::new().cyan().bold(), label, message);
}

/// Warning line with a bold yellow label, e.g. for pruned branches.
pub fn status_warn(label: &str, message: &str) {
    styled_line(Style::new().yellow().bold(), label, message);
}

/// Spinner shown while manifests are being resolved.
///
/// Hidden when stderr is not a terminal. Finish it with
/// [`ProgressBar::finish_and_clear`].
pub fn spinner(message: &str) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
