//! Level table: console tag and styles per level, and verbosity mapping.

use crate::style::{Style, TermColor};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

/// How a level is presented on the console.
#[derive(Debug, Clone)]
pub struct LevelStyle {
    /// Three-letter tag.
    pub tag: &'static str,
    /// Style of the tag.
    pub tag_style: Style,
    /// Style of the message text.
    pub message_style: Style,
}

/// Console presentation of `level`.
pub fn level_style(level: Level) -> LevelStyle {
    let (tag, tag_style, message_style) = match level {
        Level::TRACE => ("TRC", Style::fg(TermColor::Gray), Style::plain()),
        Level::DEBUG => ("DBG", Style::fg(TermColor::Green), Style::plain()),
        Level::INFO => (
            "MSG",
            Style::chain([Style::bold(), Style::fg(TermColor::Blue)]),
            Style::plain(),
        ),
        Level::WARN => (
            "WRN",
            Style::chain([Style::bold(), Style::fg(TermColor::Yellow)]),
            Style::fg(TermColor::Yellow),
        ),
        _ => (
            "ERR",
            Style::chain([
                Style::bold(),
                Style::fg(TermColor::White),
                Style::bg(TermColor::Red),
            ]),
            Style::chain([Style::bold(), Style::fg(TermColor::Red)]),
        ),
    };
    LevelStyle {
        tag,
        tag_style,
        message_style,
    }
}

/// Most verbose level shown at `verbosity`, where 0 is INFO, positive
/// values are more verbose and negative values quieter.
pub const fn level_for_verbosity(verbosity: i32) -> Level {
    match verbosity {
        i32::MIN..=-2 => Level::ERROR,
        -1 => Level::WARN,
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// [`level_for_verbosity`] as a subscriber filter.
pub fn filter_for_verbosity(verbosity: i32) -> LevelFilter {
    LevelFilter::from_level(level_for_verbosity(verbosity))
}
