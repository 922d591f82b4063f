//! Line-oriented terminal output.
//!
//! Everything goes through [`print`], which emits a `tracing` event on
//! [`PRINT_TARGET`] so output interleaves cleanly with progress bars.

use colored::*;
use sonar_common::config::Config;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const TOTAL_WIDTH: usize = 64;

#[macro_export]
macro_rules! sprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

const BANNER: &str = r#"
          ███████╗ ██████╗ ███╗   ██╗ █████╗ ██████╗
          ██╔════╝██╔═══██╗████╗  ██║██╔══██╗██╔══██╗
          ███████╗██║   ██║██╔██╗ ██║███████║██████╔╝
          ╚════██║██║   ██║██║╚██╗██║██╔══██║██╔══██╗
          ███████║╚██████╔╝██║ ╚████║██║  ██║██║  ██║
          ╚══════╝ ╚═════╝ ╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝  ╚═╝
"#;

pub fn banner(cfg: &Config) {
    if cfg.no_banner || cfg.quiet > 0 {
        return;
    }
    print(&BANNER.color(colors::PRIMARY).to_string());
    let version = format!("v{}", env!("CARGO_PKG_VERSION"));
    centered(&format!(
        "{} {} {}",
        "reachability sweeps".color(colors::TEXT_DEFAULT),
        "·".color(colors::SEPARATOR),
        version.color(colors::ACCENT)
    ));
    rule();
}

/// `──⟦ TITLE ⟧──` spanning the full width.
pub fn section(title: &str, quiet: u8) {
    if quiet > 0 {
        return;
    }
    let label = format!("⟦ {} ⟧", title.to_uppercase());
    let fill = TOTAL_WIDTH.saturating_sub(UnicodeWidthStr::width(label.as_str()));
    let (left, right) = (fill / 2, fill - fill / 2);
    print(&format!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        label.color(colors::PRIMARY),
        "─".repeat(right).color(colors::SEPARATOR)
    ));
}

pub fn rule() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

/// `> Key.....: value` lines, dot-padded to the widest key.
pub fn key_values(rows: &[(&str, ColoredString)]) {
    let width = rows.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
    for (key, value) in rows {
        let dots = ".".repeat(width + 1 - key.width());
        print(&format!(
            "{} {}{}{} {}",
            ">".color(colors::SEPARATOR),
            key.color(colors::PRIMARY),
            dots.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
    }
}

/// `[idx] title`, the head of a [`tree`].
pub fn host_heading(idx: usize, title: &str) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        title.color(colors::HOSTNAME)
    ));
}

pub fn tree(rows: &[(String, ColoredString)]) {
    let width = rows.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
    for (i, (key, value)) in rows.iter().enumerate() {
        let branch = if i + 1 == rows.len() { "└─" } else { "├─" };
        let dots = ".".repeat(width + 1 - key.width());
        print(&format!(
            " {} {}{}{} {}",
            branch.color(colors::SEPARATOR),
            key.color(colors::TEXT_DEFAULT),
            dots.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn centered(msg: &str) {
    let pad = TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2;
    print(&format!("{}{}", " ".repeat(pad), msg));
}

pub fn nothing_found(msg: &str) {
    sprint!();
    centered(&msg.color(colors::OFFLINE).bold().to_string());
    sprint!();
}
