//! Pretty-printing messages to the console

use crate::error::ErrorLog;
use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(error_message: String) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, error_message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String, line_number: usize) {
    let warning = "warning:".yellow().bold();
    eprintln!("{} line {}: {}", warning, line_number, message);
}

/// Pretty-print a progress notice (e.g. "preprocessor done for foo.as").
pub fn notice(message: &str) {
    println!("{} {}", "note:".cyan().bold(), message);
}

/// Print every logged error, numbered, with its category in brackets. Does
/// nothing when the log is empty.
pub fn print_error_summary(log: &ErrorLog) {
    if log.is_empty() {
        return;
    }
    eprintln!("\n{}", "Error Summary:".bold());
    for (index, entry) in log.iter().enumerate() {
        eprintln!(
            "{}. [{}] {}",
            index + 1,
            entry.category.to_string().yellow(),
            entry
        );
    }
}
