//! Styling for terminal output.
//!
//! Uses the anstyle ecosystem: anstream auto-detects color support, anstyle
//! composes styles. Data (JSON, listings) goes to stdout, diagnostics to stderr.

use anstyle::{AnsiColor, Color, Style};

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprintln, print, println};

/// Error emoji: `cformat!("{ERROR_EMOJI} <red>message</>")`
pub const ERROR_EMOJI: &str = "❌";

/// Hint emoji: `cformat!("{HINT_EMOJI} <dim>message</>")`
pub const HINT_EMOJI: &str = "💡";

/// Timestamps in listings
pub const TIMESTAMP: Style = Style::new().dimmed();

/// Chain labels in listings
pub const CHAIN_LABEL: Style = Style::new()
    .bold()
    .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));

/// Log level prefix colors
pub fn level_style(level: log::Level) -> Style {
    match level {
        log::Level::Error => Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))),
        log::Level::Warn => Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        _ => Style::new().dimmed(),
    }
}
