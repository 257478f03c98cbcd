//! Terminal styling helpers for command output
//!
//! Colors are applied only when stdout supports them; `anstream` strips
//! anything that slips through to a pipe.

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;

/// Check mark used in success lines
pub const CHECK: &str = "✓";

/// Semantic styles for CLI text
pub trait Stylize: Display {
    /// Bold, for headings and names
    fn emphasis(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.bold()).to_string()
    }

    /// Cyan, for identifiers and values
    fn accent(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.cyan()).to_string()
    }

    /// Dimmed, for secondary information
    fn muted(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.dimmed()).to_string()
    }

    /// Green
    fn success(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.green()).to_string()
    }

    /// Yellow
    fn warn(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.yellow()).to_string()
    }

    /// Red
    fn failure(&self) -> String {
        let text = self.to_string();
        text.if_supports_color(Stream::Stdout, |t| t.red()).to_string()
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Spinner style for network waits
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Render `url` as a clickable link when the terminal supports it
pub fn hyperlink(text: &str, url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        terminal_link::Link::new(text, url).to_string()
    } else {
        url.to_string()
    }
}

/// Color a merge status by what it means for merging
pub fn merge_status(status: &glmr::types::MergeStatus) -> String {
    use glmr::types::StatusClass;

    let text = status.as_str();
    match status.class() {
        StatusClass::Mergeable => text.success(),
        StatusClass::NeedsRebase | StatusClass::InProgress => text.warn(),
        StatusClass::Conflict => text.failure(),
        StatusClass::Unexpected => text.muted(),
    }
}
