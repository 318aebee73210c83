use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(icon: &str, text: &str) {
    println!("{} {}", icon, text.style(theme().header));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

/// `label: value` line with a dimmed label
pub fn info(label: &str, value: &str) {
    println!("  {}: {}", label.style(theme().label), value);
}

pub fn dim(text: &str) -> String {
    text.style(theme().label).to_string()
}
