//! Terminal output helpers shared across commands.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Build a progress bar styled for batched catalog processing. `total`
/// may be `0` initially and updated later via `set_length`.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap(),
    );
    pb
}

/// Print a success line prefixed with a green check mark.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error line to stderr prefixed with a red cross.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning line prefixed with a yellow triangle.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
