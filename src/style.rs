//! Text styling: shareable string transforms that wrap text in color codes.

use crossterm::style::{Color, Stylize};
use std::fmt;
use std::sync::Arc;

/// The standard terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColor {
    /// Black.
    Black,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Blue.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// White.
    White,
    /// Gray (bright black).
    Gray,
}

impl TermColor {
    /// Look up a color by its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "black" => Self::Black,
            "red" => Self::Red,
            "green" => Self::Green,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "magenta" => Self::Magenta,
            "cyan" => Self::Cyan,
            "white" => Self::White,
            "gray" | "grey" => Self::Gray,
            _ => return None,
        })
    }
}

impl From<TermColor> for Color {
    fn from(color: TermColor) -> Self {
        match color {
            TermColor::Black => Self::Black,
            TermColor::Red => Self::DarkRed,
            TermColor::Green => Self::DarkGreen,
            TermColor::Yellow => Self::DarkYellow,
            TermColor::Blue => Self::DarkBlue,
            TermColor::Magenta => Self::DarkMagenta,
            TermColor::Cyan => Self::DarkCyan,
            TermColor::White => Self::Grey,
            TermColor::Gray => Self::DarkGrey,
        }
    }
}

/// A style: a function that wraps text in styling codes.
///
/// Cheap to clone. Nesting styles is the caller's business; applying a style
/// to text that already carries codes is allowed but not normalized.
#[derive(Clone)]
pub struct Style(Option<Arc<dyn Fn(&str) -> String + Send + Sync>>);

impl Style {
    /// Wrap an arbitrary transform.
    pub fn new(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self(Some(Arc::new(f)))
    }

    /// The identity style.
    pub const fn plain() -> Self {
        Self(None)
    }

    /// Foreground color.
    pub fn fg(color: TermColor) -> Self {
        Self::new(move |s| s.with(Color::from(color)).to_string())
    }

    /// Background color.
    pub fn bg(color: TermColor) -> Self {
        Self::new(move |s| s.on(Color::from(color)).to_string())
    }

    /// Bold text.
    pub fn bold() -> Self {
        Self::new(|s| s.bold().to_string())
    }

    /// Foreground color by name; unknown names fall back to white.
    pub fn by_name(name: &str) -> Self {
        Self::fg(TermColor::from_name(name).unwrap_or(TermColor::White))
    }

    /// Compose styles, outermost first: `chain([a, b])` applies `b` then `a`.
    pub fn chain(styles: impl IntoIterator<Item = Self>) -> Self {
        let styles: Vec<Self> = styles.into_iter().filter(|s| !s.is_plain()).collect();
        match styles.len() {
            0 => Self::plain(),
            1 => styles.into_iter().next().unwrap_or_default(),
            _ => Self::new(move |s| {
                styles
                    .iter()
                    .rev()
                    .fold(s.to_string(), |text, style| style.apply(&text))
            }),
        }
    }

    /// Whether this is the identity style.
    pub const fn is_plain(&self) -> bool {
        self.0.is_none()
    }

    /// Apply the style.
    pub fn apply(&self, text: &str) -> String {
        match &self.0 {
            Some(f) => f(text),
            None => text.to_string(),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::plain()
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plain() {
            f.write_str("Style(plain)")
        } else {
            f.write_str("Style(..)")
        }
    }
}

impl From<TermColor> for Style {
    fn from(color: TermColor) -> Self {
        Self::fg(color)
    }
}

/// Left-pad `text` with spaces to `width` characters.
pub fn pad_left(text: &str, width: usize) -> String {
    format!("{text:>width$}")
}
