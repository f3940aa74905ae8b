//! Terminal output helpers: headings, labelled values and the job progress bar.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

/// Resolution of the progress bar; fractions are scaled to this length.
pub const PROGRESS_STEPS: u64 = 1000;

/// Print a section heading
pub fn print_heading(text: &str) {
    println!("\n{}", style(text).bold().cyan());
}

/// Print an info line with label and value, with the label styled
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("  {:<13} {}", style(format!("{label}:")).bold(), value);
}

pub fn print_success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

/// Progress bar for a running job. Hidden automatically when stderr is not
/// a terminal.
pub fn create_progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(PROGRESS_STEPS);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {percent:>3}% | {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_prefix(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Maps a job fraction onto the bar's length.
pub fn bar_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * PROGRESS_STEPS as f64).round() as u64
}
