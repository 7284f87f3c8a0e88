//! Styled terminal output utilities.

use owo_colors::OwoColorize;

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text);
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {text}");
}

/// Print a newline
pub fn newline() {
    println!();
}
