//! Output functions for consistent CLI formatting
//!
//! depstash runs unattended in CI, so everything here is plain println
//! with console styling. Styling degrades automatically when stdout is
//! not a terminal.

use console::style;

/// Display intro banner
pub fn intro(title: &str) {
    println!("{}", style(title).cyan().bold());
    println!();
}

/// Display success outro
pub fn outro_success(message: &str) {
    println!();
    println!("{} {}", style("[OK]").green(), message);
}

/// Display warning outro
pub fn outro_warn(message: &str) {
    println!();
    println!("{} {}", style("[WARN]").yellow(), message);
}

/// Display a section header
pub fn section(title: &str) {
    println!();
    println!("{}", style(title).bold());
}

/// Display a success step
pub fn step_ok(message: &str) {
    println!("  {} {}", style("[OK]").green(), message);
}

/// Display a success step with detail
pub fn step_ok_detail(message: &str, detail: &str) {
    println!("  {} {} ({})", style("[OK]").green(), message, detail);
}

/// Display a warning step
pub fn step_warn(message: &str) {
    println!("  {} {}", style("[WARN]").yellow(), message);
}

/// Display a warning step with hint
pub fn step_warn_hint(message: &str, hint: &str) {
    println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
}

/// Display an error step
pub fn step_error(message: &str) {
    println!("  {} {}", style("[FAIL]").red(), message);
}

/// Display an error step with detail
pub fn step_error_detail(message: &str, detail: &str) {
    println!("  {} {}: {}", style("[FAIL]").red(), message, detail);
}

/// Display a remark/hint
pub fn remark(message: &str) {
    println!("  {}", style(message).dim());
}

/// Print styled key-value pair
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}
